//! Foundation utilities shared by the clyze crates.

pub mod atomic_write;
pub mod cleanup;
pub mod echo;
pub mod logging;

pub use atomic_write::{AtomicWriteResult, replace_file_atomic};
pub use cleanup::{CleanupReport, remove_dirs_quietly};
pub use echo::{Echo, EchoBuffer};
pub use logging::init_tracing;

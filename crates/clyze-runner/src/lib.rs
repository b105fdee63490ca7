//! Process execution for tooling pipelines
//!
//! Launches external commands with stdout and stderr merged into one stream,
//! echoes every line with a tag, hands lines to an optional callback, and makes
//! sure no child outlives the process that started it. [`JvmLauncher`] builds
//! on top of that to run Java classes and archives.
//!
//! # Security Model
//!
//! All process execution goes through [`CommandSpec`] to ensure argv-style invocation.
//! Arguments are passed as discrete elements, never as shell strings.

pub mod classpath;
pub mod command_spec;
pub use clyze_utils::echo;
pub mod error;
pub mod guard;
pub mod launcher;
pub mod locator;
pub mod native;
mod platform;
pub mod process;
pub mod shutdown;

pub use classpath::{CLASSPATH_SEPARATOR, Classpath};
pub use command_spec::CommandSpec;
pub use echo::Echo;
pub use error::{ConfigError, LaunchError, ProcessError};
pub use guard::ChildGuard;
pub use launcher::{JvmLauncher, LaunchTarget};
pub use locator::{FixedHomeLocator, JavaHomeLocator, RuntimeLocator, interpreter_name};
pub use native::NativeRunner;
pub use process::{ProcessRunner, RunOutcome};

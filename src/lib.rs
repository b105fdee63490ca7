//! clyze - process launching, JVM tool runners and encoding normalization
//!
//! Helpers for analysis pipelines that drive external tools:
//!
//! - [`NativeRunner`] runs a command with stdout and stderr merged, echoes
//!   every line as `"<tag>: <line>"`, hands lines to a callback, and makes
//!   sure the child never outlives this process.
//! - [`JvmLauncher`] runs Java classes and archives through a runner.
//! - [`EncodingNormalizer`] rewrites text files to UTF-8 before tools read them.
//! - [`MethodInvocation`] is the record exchanged with those tools.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use clyze::{Classpath, Config, ConfigOverrides};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::discover(&ConfigOverrides::default())?;
//!
//! config.normalizer().ensure_canonical(Path::new("src/Main.java"))?;
//!
//! let mut facts = Vec::new();
//! let outcome = config.launcher().run_archive(
//!     &Classpath::new(),
//!     &["-Xmx2g"],
//!     "tools/analyzer.jar",
//!     &["src/Main.java"],
//!     "ANALYZER",
//!     config.debug(),
//!     Some(&mut |line: &str| facts.push(line.to_string())),
//! )?;
//! assert!(outcome.success());
//! # Ok(())
//! # }
//! ```
//!
//! Logging goes through `tracing`. Nothing is installed by default; call
//! [`init_tracing`] (or set up your own subscriber) to see events.

pub mod config;

pub use config::{
    Config, ConfigOverrides, ConfigSource, EchoMode, EncodingConfig, OutputConfig, RuntimeConfig,
};

pub use clyze_encoding::{
    EncodingNormalizer, Normalization, NormalizeError, UnchangedReason, detect_bytes,
};
pub use clyze_model::{MethodInvocation, Position, RecordError};
pub use clyze_runner::{
    CLASSPATH_SEPARATOR, ChildGuard, Classpath, CommandSpec, ConfigError, Echo, FixedHomeLocator,
    JavaHomeLocator, JvmLauncher, LaunchError, LaunchTarget, NativeRunner, ProcessError,
    ProcessRunner, RunOutcome, RuntimeLocator, shutdown,
};
pub use clyze_utils::{CleanupReport, init_tracing, remove_dirs_quietly};

/// Member crates, for APIs not re-exported here.
pub mod crates {
    pub use clyze_encoding as encoding;
    pub use clyze_model as model;
    pub use clyze_runner as runner;
    pub use clyze_utils as utils;
}

use thiserror::Error;

/// Any error produced by the clyze crates.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Runtime(#[from] ConfigError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("Configuration error: {0:#}")]
    Config(#[from] anyhow::Error),
}

/// Convenience alias for results using [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

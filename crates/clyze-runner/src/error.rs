//! Error types for process execution and runtime launching

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while building, starting, or streaming a child process
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Command is empty")]
    EmptyCommand,

    #[error("Executable not found: '{program}': {reason}")]
    ExecutableNotFound { program: String, reason: String },

    #[error("Failed to spawn process '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read output of '{program}': {source}")]
    Read {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to wait for process '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to tie process '{program}' to the parent lifetime: {reason}")]
    Containment { program: String, reason: String },
}

/// Environment misconfiguration detected before anything is spawned
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the runtime home directory to run: {target}")]
    RuntimeHomeUnknown { target: String },

    #[error("Could not find '{interpreter}' in {}, cannot run: {target}", .home.display())]
    InterpreterNotFound {
        interpreter: String,
        home: PathBuf,
        target: String,
    },
}

/// Errors from [`JvmLauncher`](crate::JvmLauncher) operations
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Runtime configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Process error: {0}")]
    Process(#[from] ProcessError),
}

impl LaunchError {
    /// True when the failure is an environment problem rather than a process problem.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

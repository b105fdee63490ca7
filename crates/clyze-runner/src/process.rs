use crate::error::ProcessError;

use super::CommandSpec;

// ============================================================================
// ProcessRunner Trait - Streaming Process Execution Interface
// ============================================================================

/// What a completed run reports.
///
/// A non-zero exit code is not an error: the run succeeded in the sense that
/// the process was started, its whole output was streamed, and it was reaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Pid the child had while running
    pub pid: u32,
    /// Number of lines delivered from the combined output stream
    pub lines: usize,
    /// Exit code (None if terminated by a signal)
    pub exit_code: Option<i32>,
}

impl RunOutcome {
    /// Check if the process exited with code 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait for streaming process execution.
///
/// Implementations MUST use argv-style APIs only (no shell string evaluation),
/// MUST deliver lines to `on_line` in the order they were produced, and MUST
/// NOT return while a child they started is still running.
///
/// # Example
///
/// ```rust
/// use clyze_runner::{CommandSpec, ProcessError, ProcessRunner, RunOutcome};
///
/// struct CannedRunner(Vec<&'static str>);
///
/// impl ProcessRunner for CannedRunner {
///     fn run(
///         &self,
///         _cmd: &CommandSpec,
///         _prefix: &str,
///         mut on_line: Option<&mut dyn FnMut(&str)>,
///     ) -> Result<RunOutcome, ProcessError> {
///         for line in &self.0 {
///             if let Some(cb) = on_line.as_mut() {
///                 cb(*line);
///             }
///         }
///         Ok(RunOutcome { pid: 0, lines: self.0.len(), exit_code: Some(0) })
///     }
/// }
///
/// let mut seen = Vec::new();
/// let runner = CannedRunner(vec!["a", "b"]);
/// runner
///     .run(&CommandSpec::new("tool"), "T", Some(&mut |l: &str| seen.push(l.to_string())))
///     .unwrap();
/// assert_eq!(seen, ["a", "b"]);
/// ```
pub trait ProcessRunner {
    /// Run `cmd` to completion, streaming its combined stdout/stderr.
    ///
    /// Every line is echoed as `"<prefix>: <line>"` and then passed to
    /// `on_line`, synchronously.
    ///
    /// # Errors
    ///
    /// A [`ProcessError`] if the process cannot be started, contained, read,
    /// or reaped.
    fn run(
        &self,
        cmd: &CommandSpec,
        prefix: &str,
        on_line: Option<&mut dyn FnMut(&str)>,
    ) -> Result<RunOutcome, ProcessError>;
}

use std::borrow::Cow;
use std::io::{self, BufRead, BufReader, Read};
use std::process::Stdio;

use tracing::{debug, error};

use crate::echo::Echo;
use crate::error::ProcessError;
use crate::guard::ChildGuard;

use super::{CommandSpec, ProcessRunner, RunOutcome};

// ============================================================================
// NativeRunner - Streaming Native Process Execution
// ============================================================================

/// Native process runner using `std::process::Command`.
///
/// The child's stdout and stderr share one OS pipe, so the parent reads a
/// single combined stream in the order the OS delivered it. One reader means
/// no risk of deadlocking on a full second pipe; the price is that a line no
/// longer says which stream it came from.
///
/// The child runs under a [`ChildGuard`]: it is killed if the run fails
/// midway or if this process dies first.
///
/// # Example
///
/// ```rust,no_run
/// use clyze_runner::{CommandSpec, NativeRunner, ProcessRunner};
///
/// let runner = NativeRunner::new();
/// let cmd = CommandSpec::new("echo").arg("hello");
///
/// let mut lines = Vec::new();
/// runner
///     .run(&cmd, "T", Some(&mut |line: &str| lines.push(line.to_string())))
///     .unwrap();
/// assert_eq!(lines, ["hello"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NativeRunner {
    echo: Echo,
}

impl NativeRunner {
    /// Runner echoing to standard output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner echoing to the given sink.
    #[must_use]
    pub const fn with_echo(echo: Echo) -> Self {
        Self { echo }
    }

    /// The echo this runner writes tagged lines to.
    #[must_use]
    pub const fn echo(&self) -> &Echo {
        &self.echo
    }

    fn pump<R: Read>(
        &self,
        reader: R,
        prefix: &str,
        mut on_line: Option<&mut dyn FnMut(&str)>,
    ) -> io::Result<usize> {
        let mut reader = BufReader::new(reader);
        let mut raw = Vec::with_capacity(256);
        let mut count = 0;

        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            let decoded = decode_line(&raw);
            let line: &str = &decoded;
            self.echo.line(prefix, line);
            if let Some(cb) = on_line.as_mut() {
                cb(line);
            }
            count += 1;
        }

        Ok(count)
    }

    /// Drain `reader` and reap the child. On a read failure the guard is
    /// dropped, which kills the child and removes its shutdown hook.
    fn stream<R: Read>(
        &self,
        guard: ChildGuard,
        reader: R,
        prefix: &str,
        on_line: Option<&mut dyn FnMut(&str)>,
    ) -> Result<RunOutcome, ProcessError> {
        let program = guard.program().to_owned();
        let pid = guard.pid();

        let lines = match self.pump(reader, prefix, on_line) {
            Ok(lines) => lines,
            Err(source) => {
                let err = ProcessError::Read {
                    program: program.clone(),
                    source,
                };
                error!(program = %program, pid, error = %err, "Output stream failed");
                return Err(err);
            }
        };

        let status = guard.wait().inspect_err(|e| {
            error!(program = %program, pid, error = %e, "Could not reap process");
        })?;

        debug!(program = %program, pid, lines, code = ?status.code(), "Process finished");

        Ok(RunOutcome {
            pid,
            lines,
            exit_code: status.code(),
        })
    }
}

impl ProcessRunner for NativeRunner {
    fn run(
        &self,
        cmd: &CommandSpec,
        prefix: &str,
        on_line: Option<&mut dyn FnMut(&str)>,
    ) -> Result<RunOutcome, ProcessError> {
        let program = cmd.program_name();
        let spawn_failed = |source: io::Error| ProcessError::Spawn {
            program: program.clone(),
            source,
        };

        let (reader, writer) = io::pipe().map_err(spawn_failed)?;
        let stderr_writer = writer.try_clone().map_err(spawn_failed)?;

        let mut command = cmd.to_command();
        command
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr_writer);

        debug!(program = %program, args = ?cmd.args, prefix, "Running process");

        // The command (and with it our copies of the write end) is dropped
        // inside spawn_command, so EOF arrives once the child side closes.
        let guard = ChildGuard::spawn_command(command, program.clone()).inspect_err(|e| {
            error!(program = %program, error = %e, "Could not start process");
        })?;
        self.stream(guard, reader, prefix, on_line)
    }
}

/// Strip the line terminator (`\n` or `\r\n`) and decode lossily.
fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}

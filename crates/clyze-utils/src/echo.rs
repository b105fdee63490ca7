//! Diagnostic channel for tagged subprocess output and plain messages

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Where tagged output lines and diagnostic messages go.
///
/// Cloning an `Echo` shares the underlying writer. Write failures are ignored:
/// a closed terminal must not abort the subprocess being observed.
#[derive(Clone)]
pub struct Echo {
    target: EchoTarget,
    sink: Option<SharedWriter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EchoTarget {
    Stdout,
    Stderr,
    Writer,
    Silent,
}

impl Echo {
    /// Echo to the process's standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::with_target(EchoTarget::Stdout, Box::new(io::stdout()))
    }

    /// Echo to the process's standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_target(EchoTarget::Stderr, Box::new(io::stderr()))
    }

    /// Discard everything.
    #[must_use]
    pub const fn silent() -> Self {
        Self {
            target: EchoTarget::Silent,
            sink: None,
        }
    }

    /// Echo into an arbitrary writer.
    #[must_use]
    pub fn to_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self::with_target(EchoTarget::Writer, Box::new(writer))
    }

    /// Echo into an in-memory buffer, returned alongside for inspection.
    #[must_use]
    pub fn buffer() -> (Self, EchoBuffer) {
        let buffer = EchoBuffer::default();
        (Self::to_writer(buffer.clone()), buffer)
    }

    fn with_target(target: EchoTarget, writer: Box<dyn Write + Send>) -> Self {
        Self {
            target,
            sink: Some(Arc::new(Mutex::new(writer))),
        }
    }

    /// Write `"<prefix>: <line>"`.
    pub fn line(&self, prefix: &str, line: &str) {
        self.write_with(|w| writeln!(w, "{prefix}: {line}"));
    }

    /// Write a plain diagnostic message.
    pub fn message(&self, message: &str) {
        self.write_with(|w| writeln!(w, "{message}"));
    }

    /// True if this echo discards everything.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        self.sink.is_none()
    }

    fn write_with(&self, f: impl FnOnce(&mut dyn Write) -> io::Result<()>) {
        if let Some(sink) = &self.sink {
            let mut guard = sink.lock().unwrap_or_else(PoisonError::into_inner);
            if f(&mut **guard).is_ok() {
                let _ = guard.flush();
            }
        }
    }
}

impl Default for Echo {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for Echo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Echo").field("target", &self.target).finish()
    }
}

/// Shared in-memory sink produced by [`Echo::buffer`].
#[derive(Debug, Clone, Default)]
pub struct EchoBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl EchoBuffer {
    /// Everything written so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Written content split into lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for EchoBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_is_prefixed() {
        let (echo, buffer) = Echo::buffer();
        echo.line("T", "hello");
        echo.line("", "bare");
        assert_eq!(buffer.lines(), vec!["T: hello", ": bare"]);
    }

    #[test]
    fn test_message_is_plain() {
        let (echo, buffer) = Echo::buffer();
        echo.message("Running program: java -version");
        assert_eq!(buffer.contents(), "Running program: java -version\n");
    }

    #[test]
    fn test_clones_share_writer() {
        let (echo, buffer) = Echo::buffer();
        let other = echo.clone();
        echo.line("a", "1");
        other.line("b", "2");
        assert_eq!(buffer.lines(), vec!["a: 1", "b: 2"]);
    }

    #[test]
    fn test_silent_discards() {
        let echo = Echo::silent();
        assert!(echo.is_silent());
        echo.line("T", "dropped");
        assert!(!Echo::stdout().is_silent());
    }
}

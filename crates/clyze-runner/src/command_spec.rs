use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use crate::error::ProcessError;

/// A program plus its argv, working directory and environment overrides.
///
/// Every launch in this crate is built from one of these. Arguments stay
/// discrete `OsString`s all the way to `execve`; nothing is ever handed to a shell.
///
/// # Example
///
/// ```rust
/// use clyze_runner::CommandSpec;
/// use std::ffi::OsString;
///
/// let cmd = CommandSpec::new("java")
///     .arg("-cp")
///     .arg("a.jar:b.jar")
///     .arg("org.example.Main")
///     .cwd("/path/to/workspace");
///
/// assert_eq!(cmd.program, OsString::from("java"));
/// assert_eq!(cmd.args.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
    /// Inherited from the parent when `None`
    pub cwd: Option<PathBuf>,
    /// Added on top of the inherited environment
    pub env: Option<HashMap<OsString, OsString>>,
}

impl CommandSpec {
    /// Command running `program` with no arguments.
    ///
    /// The program is not checked; a missing executable surfaces as
    /// [`ProcessError::Spawn`] when the command runs. Use
    /// [`from_argv`](Self::from_argv) to validate up front.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: None,
        }
    }

    /// Build a command from a full argv (program first).
    ///
    /// # Errors
    ///
    /// * [`ProcessError::EmptyCommand`] if `argv` has no elements
    /// * [`ProcessError::ExecutableNotFound`] if the first element does not
    ///   resolve to an executable, either as a path or through `PATH`
    ///
    /// ```rust
    /// use clyze_runner::{CommandSpec, ProcessError};
    ///
    /// let err = CommandSpec::from_argv(Vec::<String>::new()).unwrap_err();
    /// assert!(matches!(err, ProcessError::EmptyCommand));
    /// ```
    pub fn from_argv<I, S>(argv: I) -> Result<Self, ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let program = argv.next().ok_or(ProcessError::EmptyCommand)?;

        which::which(&program).map_err(|e| ProcessError::ExecutableNotFound {
            program: program.to_string_lossy().into_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self::new(program).args(argv))
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Override one environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn envs<I, K, V>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        let env_map = self.env.get_or_insert_with(HashMap::new);
        for (key, value) in envs {
            env_map.insert(key.into(), value.into());
        }
        self
    }

    /// Program name for messages (lossy).
    #[must_use]
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Program followed by arguments, lossily converted for display.
    #[must_use]
    pub fn argv_lossy(&self) -> Vec<String> {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }

    /// Space-joined argv, as printed in debug output. Not a shell string.
    #[must_use]
    pub fn display_line(&self) -> String {
        self.argv_lossy().join(" ")
    }

    /// Build the `std::process::Command`.
    ///
    /// Stdio is left untouched; the runner decides how streams are wired.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        if let Some(ref env) = self.env {
            for (key, value) in env {
                cmd.env(key, value);
            }
        }

        cmd
    }
}

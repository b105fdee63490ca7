//! Launching Java programs through a [`ProcessRunner`]

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;

use tracing::{debug, error};

use crate::classpath::Classpath;
use crate::command_spec::CommandSpec;
use crate::echo::Echo;
use crate::error::{ConfigError, LaunchError};
use crate::locator::{self, JavaHomeLocator, RuntimeLocator};
use crate::native::NativeRunner;
use crate::process::{ProcessRunner, RunOutcome};

/// What the interpreter should start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchTarget {
    /// A standalone archive, started with `-jar <archive>`
    Archive(PathBuf),
    /// A fully qualified main class
    Class(String),
}

impl LaunchTarget {
    /// Runtime arguments selecting this target.
    #[must_use]
    pub fn to_args(&self) -> Vec<OsString> {
        match self {
            Self::Archive(archive) => vec!["-jar".into(), archive.clone().into_os_string()],
            Self::Class(class) => vec![class.into()],
        }
    }
}

/// Runs Java classes and archives with merged, tagged output.
///
/// The interpreter is looked up on every launch through the configured
/// [`RuntimeLocator`], so a changed environment is picked up without
/// rebuilding the launcher. Arguments configured with
/// [`with_jvm_args`](Self::with_jvm_args) go before the per-call runtime
/// arguments.
///
/// ```rust,no_run
/// use clyze_runner::{Classpath, JvmLauncher};
///
/// let launcher = JvmLauncher::new();
/// let classpath = Classpath::new().entry("lib/tool.jar");
/// let outcome = launcher
///     .run_class(&classpath, &["-Xmx1g"], "org.example.Main", &["--verbose"], "TOOL", false, None)
///     .unwrap();
/// println!("exit code: {:?}", outcome.exit_code);
/// ```
pub struct JvmLauncher<R: ProcessRunner = NativeRunner> {
    runner: R,
    locator: Box<dyn RuntimeLocator>,
    diagnostics: Echo,
    jvm_args: Vec<OsString>,
}

impl JvmLauncher<NativeRunner> {
    /// Launcher with the native runner, `JAVA_HOME` lookup, and debug
    /// output on stderr.
    #[must_use]
    pub fn new() -> Self {
        Self::with_runner(NativeRunner::new())
    }
}

impl Default for JvmLauncher<NativeRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ProcessRunner> JvmLauncher<R> {
    /// Launcher that runs through `runner`, with `JAVA_HOME` lookup and
    /// debug output on stderr.
    #[must_use]
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner,
            locator: Box::new(JavaHomeLocator::new()),
            diagnostics: Echo::stderr(),
            jvm_args: Vec::new(),
        }
    }

    /// Replace the `JAVA_HOME` lookup with `locator`.
    #[must_use]
    pub fn with_locator(mut self, locator: impl RuntimeLocator + 'static) -> Self {
        self.locator = Box::new(locator);
        self
    }

    /// Where `Running program: ...` lines go in debug mode.
    #[must_use]
    pub fn with_diagnostics(mut self, echo: Echo) -> Self {
        self.diagnostics = echo;
        self
    }

    /// Arguments passed to every launch, before the per-call runtime arguments.
    #[must_use]
    pub fn with_jvm_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.jvm_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// The runner every launch goes through.
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Arguments set by [`with_jvm_args`](Self::with_jvm_args).
    #[must_use]
    pub fn jvm_args(&self) -> &[OsString] {
        &self.jvm_args
    }

    /// Run a standalone archive: `java [-cp <cp>] <runtime_args> -jar <archive> <program_args>`.
    ///
    /// # Errors
    ///
    /// See [`run_runtime`](Self::run_runtime).
    #[allow(clippy::too_many_arguments)]
    pub fn run_archive<A, P>(
        &self,
        classpath: &Classpath,
        runtime_args: &[A],
        archive: impl Into<PathBuf>,
        program_args: &[P],
        tag: &str,
        debug: bool,
        on_line: Option<&mut dyn FnMut(&str)>,
    ) -> Result<RunOutcome, LaunchError>
    where
        A: AsRef<OsStr>,
        P: AsRef<OsStr>,
    {
        let target = LaunchTarget::Archive(archive.into());
        let runtime_args = with_target(runtime_args, &target);
        self.run_runtime(classpath, &runtime_args, program_args, tag, debug, on_line)
    }

    /// Run a main class: `java [-cp <cp>] <runtime_args> <class_name> <program_args>`.
    ///
    /// # Errors
    ///
    /// See [`run_runtime`](Self::run_runtime).
    #[allow(clippy::too_many_arguments)]
    pub fn run_class<A, P>(
        &self,
        classpath: &Classpath,
        runtime_args: &[A],
        class_name: &str,
        program_args: &[P],
        tag: &str,
        debug: bool,
        on_line: Option<&mut dyn FnMut(&str)>,
    ) -> Result<RunOutcome, LaunchError>
    where
        A: AsRef<OsStr>,
        P: AsRef<OsStr>,
    {
        let target = LaunchTarget::Class(class_name.to_string());
        let runtime_args = with_target(runtime_args, &target);
        self.run_runtime(classpath, &runtime_args, program_args, tag, debug, on_line)
    }

    /// Run the interpreter with `runtime_args` already naming what to start.
    ///
    /// When `debug` is set the full command line is written to the
    /// diagnostic echo before launching. Every output line is echoed with
    /// `tag` and handed to `on_line`.
    ///
    /// # Errors
    ///
    /// [`LaunchError::Config`] when the interpreter cannot be located (nothing
    /// is spawned), [`LaunchError::Process`] when running it fails.
    pub fn run_runtime<A, P>(
        &self,
        classpath: &Classpath,
        runtime_args: &[A],
        program_args: &[P],
        tag: &str,
        debug: bool,
        on_line: Option<&mut dyn FnMut(&str)>,
    ) -> Result<RunOutcome, LaunchError>
    where
        A: AsRef<OsStr>,
        P: AsRef<OsStr>,
    {
        let cmd = self
            .build_command(classpath, runtime_args, program_args)
            .inspect_err(|e| error!(error = %e, "Cannot launch runtime"))?;

        if debug {
            self.diagnostics
                .message(&format!("Running program: {}", cmd.display_line()));
        }
        debug!(command = %cmd.display_line(), tag, "Launching runtime");

        Ok(self.runner.run(&cmd, tag, on_line)?)
    }

    /// Assemble the full interpreter command line without running it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::RuntimeHomeUnknown`] when the locator knows no home,
    /// [`ConfigError::InterpreterNotFound`] when the home has no interpreter.
    pub fn build_command<A, P>(
        &self,
        classpath: &Classpath,
        runtime_args: &[A],
        program_args: &[P],
    ) -> Result<CommandSpec, ConfigError>
    where
        A: AsRef<OsStr>,
        P: AsRef<OsStr>,
    {
        let all_runtime_args: Vec<&OsStr> = self
            .jvm_args
            .iter()
            .map(OsString::as_os_str)
            .chain(runtime_args.iter().map(|a| a.as_ref()))
            .collect();

        let home = self
            .locator
            .runtime_home()
            .ok_or_else(|| ConfigError::RuntimeHomeUnknown {
                target: describe(&all_runtime_args),
            })?;
        let interpreter = locator::resolve_interpreter(&home).ok_or_else(|| {
            ConfigError::InterpreterNotFound {
                interpreter: locator::interpreter_name(),
                home: home.clone(),
                target: describe(&all_runtime_args),
            }
        })?;

        let mut cmd = CommandSpec::new(interpreter);
        if let Some(joined) = classpath.joined() {
            cmd = cmd.arg("-cp").arg(joined);
        }
        Ok(cmd
            .args(all_runtime_args)
            .args(program_args.iter().map(|a| a.as_ref().to_os_string())))
    }
}

impl<R: ProcessRunner + fmt::Debug> fmt::Debug for JvmLauncher<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JvmLauncher")
            .field("runner", &self.runner)
            .field("diagnostics", &self.diagnostics)
            .field("jvm_args", &self.jvm_args)
            .finish_non_exhaustive()
    }
}

fn with_target<A: AsRef<OsStr>>(runtime_args: &[A], target: &LaunchTarget) -> Vec<OsString> {
    runtime_args
        .iter()
        .map(|a| a.as_ref().to_os_string())
        .chain(target.to_args())
        .collect()
}

fn describe(args: &[&OsStr]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

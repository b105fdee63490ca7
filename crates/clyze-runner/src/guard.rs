//! Scoped ownership of a running child process

use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::{debug, warn};

use crate::command_spec::CommandSpec;
use crate::error::ProcessError;
use crate::platform::{self, Containment};
use crate::shutdown::ShutdownHook;

/// Owns a child process for the duration of a call.
///
/// While the guard is alive the child is registered in the
/// [`shutdown`](crate::shutdown) registry and contained by the platform
/// (own process group plus parent-death signal on Linux, Job Object on
/// Windows). Dropping the guard before the child has been reaped kills the
/// child (and its process group on Unix) and waits for it, so an early return,
/// an error, or a panic in a line callback never leaves an orphan.
///
/// On Linux the parent-death signal is tied to the spawning *thread*: keep the
/// guard on the thread that created it.
#[derive(Debug)]
pub struct ChildGuard {
    child: Child,
    program: String,
    reaped: bool,
    _containment: ContainmentSlot,
    _hook: ShutdownHook,
}

// Containment has no Debug; keep the guard printable.
struct ContainmentSlot(#[allow(dead_code)] Containment);

impl std::fmt::Debug for ContainmentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Containment")
    }
}

impl ChildGuard {
    /// Spawn `spec` with null stdio under a guard.
    ///
    /// # Errors
    ///
    /// [`ProcessError::Spawn`] if the process cannot be started,
    /// [`ProcessError::Containment`] if it cannot be tied to this process
    /// (the child is killed before returning).
    pub fn spawn(spec: &CommandSpec) -> Result<Self, ProcessError> {
        let mut command = spec.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        Self::spawn_command(command, spec.program_name())
    }

    /// Spawn a prepared command. The command is dropped right after spawning,
    /// releasing any pipe ends it holds.
    pub(crate) fn spawn_command(mut command: Command, program: String) -> Result<Self, ProcessError> {
        platform::configure(&mut command);

        let spawned = command.spawn();
        drop(command);

        let child = spawned.map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;

        let hook = ShutdownHook::register(child.id());
        let containment = match platform::attach(&child) {
            Ok(containment) => containment,
            Err(reason) => {
                let mut orphan = child;
                platform::kill_tree(orphan.id());
                let _ = orphan.kill();
                let _ = orphan.wait();
                drop(hook);
                return Err(ProcessError::Containment { program, reason });
            }
        };

        debug!(program = %program, pid = child.id(), "Spawned guarded process");

        Ok(Self {
            child,
            program,
            reaped: false,
            _containment: ContainmentSlot(containment),
            _hook: hook,
        })
    }

    /// OS process id of the child.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Program name, for messages.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Non-blocking exit check.
    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }

    /// Block until the child exits, then release the guard.
    ///
    /// # Errors
    ///
    /// [`ProcessError::Wait`] if waiting fails; the child is then killed by
    /// the guard's drop.
    pub fn wait(mut self) -> Result<ExitStatus, ProcessError> {
        match self.child.wait() {
            Ok(status) => {
                self.reaped = true;
                debug!(program = %self.program, pid = self.child.id(), code = ?status.code(), "Process exited");
                Ok(status)
            }
            Err(source) => Err(ProcessError::Wait {
                program: self.program.clone(),
                source,
            }),
        }
    }

    /// Forcibly terminate the child (and its group on Unix) and reap it.
    pub fn kill(&mut self) -> io::Result<ExitStatus> {
        platform::kill_tree(self.child.id());
        let _ = self.child.kill();
        let status = self.child.wait()?;
        self.reaped = true;
        Ok(status)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        match self.child.try_wait() {
            Ok(Some(_)) => {}
            _ => {
                warn!(program = %self.program, pid = self.child.id(), "Terminating process left running");
                platform::kill_tree(self.child.id());
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
        }
    }
}

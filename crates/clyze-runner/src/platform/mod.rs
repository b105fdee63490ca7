//! Per-platform measures that tie a child's lifetime to ours.

use std::process::{Child, Command};

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows_job;

/// Platform state that must live as long as the child is running.
pub(crate) struct Containment {
    #[cfg(windows)]
    _job: windows_job::JobObjectHandle,
}

/// Prepare `cmd` before spawning.
pub(crate) fn configure(cmd: &mut Command) {
    #[cfg(unix)]
    unix::configure(cmd);

    #[cfg(not(unix))]
    let _ = cmd;
}

/// Attach platform containment to a freshly spawned child.
pub(crate) fn attach(child: &Child) -> Result<Containment, String> {
    #[cfg(windows)]
    {
        let job = windows_job::create_job_object()?;
        windows_job::assign_to_job(&job, child)?;
        Ok(Containment { _job: job })
    }

    #[cfg(not(windows))]
    {
        let _ = child;
        Ok(Containment {})
    }
}

/// Forcibly terminate `pid` and, where supported, its descendants.
pub(crate) fn kill_tree(pid: u32) {
    #[cfg(unix)]
    unix::kill_tree(pid);

    #[cfg(windows)]
    windows_job::terminate(pid);

    #[cfg(not(any(unix, windows)))]
    let _ = pid;
}

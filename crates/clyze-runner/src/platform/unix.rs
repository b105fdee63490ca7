use std::io;
use std::os::unix::process::CommandExt;
use std::process::Command;

use nix::sys::signal::{Signal, kill, killpg};
use nix::unistd::Pid;

pub(crate) fn configure(cmd: &mut Command) {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    let parent = std::process::id() as libc::pid_t;

    // SAFETY: the closure only calls async-signal-safe functions and does not allocate.
    unsafe {
        cmd.pre_exec(move || {
            // Own process group, so killpg reaches the whole tree.
            if libc::setpgid(0, 0) != 0 {
                return Err(io::Error::last_os_error());
            }

            #[cfg(any(target_os = "linux", target_os = "android"))]
            {
                if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL as libc::c_ulong) != 0 {
                    return Err(io::Error::last_os_error());
                }
                // The parent may have died between fork and prctl.
                if libc::getppid() != parent {
                    return Err(io::Error::from_raw_os_error(libc::ESRCH));
                }
            }

            Ok(())
        });
    }
}

pub(crate) fn kill_tree(pid: u32) {
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    if raw <= 0 {
        return;
    }

    let pid = Pid::from_raw(raw);
    if killpg(pid, Signal::SIGKILL).is_err() {
        let _ = kill(pid, Signal::SIGKILL);
    }
}

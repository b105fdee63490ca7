//! Process-wide registry of children that must not outlive this process
//!
//! Every running child owned by a [`ChildGuard`](crate::ChildGuard) holds a
//! [`ShutdownHook`] in this registry. The hook is removed when the guard
//! reaps the child, so after a run returns nothing of it is left behind.
//!
//! On Unix an `atexit` handler kills every child still registered when the
//! process exits normally. Abnormal exits are covered per child by the
//! platform containment (parent-death signal on Linux, Job Objects on Windows).
//!
//! Other Unix systems have no parent-death signal, so there SIGINT, SIGTERM
//! and SIGHUP get a handler that kills registered children and then re-raises
//! the signal. A handler the program installed first is left in place. Such
//! programs, and any parent killed by SIGKILL or a crash, are not covered:
//! call [`kill_registered`] from your own handler.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use crate::platform;

static REGISTRY: Lazy<Mutex<HashMap<u64, u32>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Lock-free copy of the registered pids, readable from a signal handler.
const SIGNAL_SLOTS: usize = 64;
static SLOTS: [AtomicU32; SIGNAL_SLOTS] = [const { AtomicU32::new(0) }; SIGNAL_SLOTS];

#[cfg(unix)]
static EXIT_HANDLER: std::sync::Once = std::sync::Once::new();

/// Registration of one child pid; deregisters on drop.
#[derive(Debug)]
pub struct ShutdownHook {
    id: u64,
    pid: u32,
    slot: Option<usize>,
}

impl ShutdownHook {
    /// Register `pid` to be killed if this process exits first.
    #[must_use]
    pub fn register(pid: u32) -> Self {
        install_exit_handler();

        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        REGISTRY
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, pid);
        let slot = claim_slot(&SLOTS, pid);
        if slot.is_none() {
            debug!(pid, "Signal slots full; child covered at exit only");
        }
        debug!(hook_id = id, pid, "Registered shutdown hook");

        Self { id, pid, slot }
    }

    /// Registry key of this hook.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Pid this hook targets.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for ShutdownHook {
    fn drop(&mut self) {
        REGISTRY
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
        if let Some(slot) = self.slot {
            release_slot(&SLOTS, slot, self.pid);
        }
        debug!(hook_id = self.id, pid = self.pid, "Deregistered shutdown hook");
    }
}

/// Number of hooks currently registered.
#[must_use]
pub fn registered_count() -> usize {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner).len()
}

/// Whether some hook currently targets `pid`.
#[must_use]
pub fn is_registered(pid: u32) -> bool {
    REGISTRY
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .values()
        .any(|&p| p == pid)
}

/// Forcibly terminate every registered child. Returns how many were signalled.
///
/// Hooks stay registered; the owning guards still reap and deregister.
/// Uses `try_lock` so it is safe to call while exiting: if the registry is
/// held by another thread the call does nothing and returns 0.
pub fn kill_registered() -> usize {
    let pids: Vec<u32> = match REGISTRY.try_lock() {
        Ok(map) => map.values().copied().collect(),
        Err(std::sync::TryLockError::Poisoned(poisoned)) => {
            poisoned.into_inner().values().copied().collect()
        }
        Err(std::sync::TryLockError::WouldBlock) => return 0,
    };

    for &pid in &pids {
        platform::kill_tree(pid);
    }
    pids.len()
}

#[cfg(unix)]
fn install_exit_handler() {
    EXIT_HANDLER.call_once(|| {
        // SAFETY: `run_exit_hooks` is a plain extern "C" fn with no captured state.
        let rc = unsafe { libc::atexit(run_exit_hooks) };
        if rc != 0 {
            debug!("atexit registration failed; relying on per-child containment");
        }
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        install_signal_handlers();
    });
}

#[cfg(all(unix, not(any(target_os = "linux", target_os = "android"))))]
fn install_signal_handlers() {
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

    let action = SigAction::new(
        SigHandler::Handler(on_fatal_signal),
        SaFlags::SA_RESETHAND,
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP] {
        // SAFETY: `on_fatal_signal` only touches atomics and async-signal-safe libc calls.
        match unsafe { sigaction(signal, &action) } {
            Ok(previous) if previous.handler() != SigHandler::SigDfl => {
                // Someone else handles this signal; put their handler back.
                let _ = unsafe { sigaction(signal, &previous) };
            }
            Ok(_) => debug!(signal = %signal, "Installed child cleanup handler"),
            Err(e) => debug!(signal = %signal, error = %e, "Could not install signal handler"),
        }
    }
}

#[cfg(all(unix, not(any(target_os = "linux", target_os = "android"))))]
extern "C" fn on_fatal_signal(signum: libc::c_int) {
    kill_slotted(&SLOTS);
    // SA_RESETHAND restored the default action, so this terminates us.
    unsafe {
        libc::raise(signum);
    }
}

/// Record `pid` in the first free slot.
fn claim_slot(slots: &[AtomicU32], pid: u32) -> Option<usize> {
    slots.iter().position(|slot| {
        slot.compare_exchange(0, pid, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    })
}

fn release_slot(slots: &[AtomicU32], slot: usize, pid: u32) {
    if let Some(cell) = slots.get(slot) {
        let _ = cell.compare_exchange(pid, 0, Ordering::AcqRel, Ordering::Relaxed);
    }
}

/// SIGKILL every slotted pid and its process group. Async-signal-safe.
#[cfg(unix)]
#[cfg_attr(any(target_os = "linux", target_os = "android"), allow(dead_code))]
fn kill_slotted(slots: &[AtomicU32]) -> usize {
    let mut killed = 0;
    for slot in slots {
        let pid = slot.load(Ordering::Acquire);
        let Ok(raw) = libc::pid_t::try_from(pid) else {
            continue;
        };
        if raw <= 0 {
            continue;
        }
        // SAFETY: plain syscalls on a pid we spawned.
        unsafe {
            if libc::killpg(raw, libc::SIGKILL) != 0 {
                libc::kill(raw, libc::SIGKILL);
            }
        }
        killed += 1;
    }
    killed
}

#[cfg(not(unix))]
fn install_exit_handler() {}

#[cfg(unix)]
extern "C" fn run_exit_hooks() {
    let _ = kill_registered();
}

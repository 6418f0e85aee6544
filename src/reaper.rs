//! The reap loop: collects every exited descendant and decides when the
//! whole group shuts down.

use std::fmt;

use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;

use crate::registry::ProcessRegistry;

/// Why a reaped process ended.
pub enum ExitReason {
    Exited(i32),
    Signaled(Signal),
}

impl ExitReason {
    /// The exit code the supervisor propagates for this reason. Normal
    /// exits keep their code; signal deaths map to 128 + signal number,
    /// following shell convention.
    pub fn code(&self) -> i32 {
        match self {
            ExitReason::Exited(code) => *code,
            ExitReason::Signaled(sig) => 128 + *sig as i32,
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExitReason::Exited(code) => write!(f, "code {}", code),
            ExitReason::Signaled(sig) => write!(f, "{:?}", sig),
        }
    }
}

/// Extracts the pid and exit reason from a wait status. Stop and
/// continue events are not exits and yield `None`.
pub fn exit_event(status: WaitStatus) -> Option<(Pid, ExitReason)> {
    match status {
        WaitStatus::Exited(pid, code) => Some((pid, ExitReason::Exited(code))),
        WaitStatus::Signaled(pid, sig, _) => Some((pid, ExitReason::Signaled(sig))),
        _ => None,
    }
}

/// Shutdown bookkeeping, owned exclusively by the reap loop.
pub struct SupervisorState {
    finishing: bool,
    main_exit_code: i32,
}

impl SupervisorState {
    pub fn new() -> Self {
        Self {
            finishing: false,
            main_exit_code: 0,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.main_exit_code
    }

    /// Records a tracked exit. Returns true only for the first one: the
    /// exit code is latched then and never overwritten.
    fn latch(&mut self, reason: &ExitReason) -> bool {
        if self.finishing {
            return false;
        }

        self.finishing = true;
        self.main_exit_code = reason.code();
        true
    }
}

impl Default for SupervisorState {
    fn default() -> Self {
        Self::new()
    }
}

/// What a single reaped exit amounts to.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Not one of ours; reaped and forgotten.
    Orphan,
    /// First tracked exit; a shutdown broadcast is due.
    Shutdown,
    /// Tracked exit after shutdown already started.
    Noted,
}

/// One step of the reaper state machine, separated from the blocking
/// wait so the transition table can be tested directly.
pub fn observe(
    registry: &ProcessRegistry,
    state: &mut SupervisorState,
    pid: Pid,
    reason: &ExitReason,
) -> Outcome {
    if !registry.contains(pid) {
        return Outcome::Orphan;
    }

    if state.latch(reason) {
        Outcome::Shutdown
    } else {
        Outcome::Noted
    }
}

/// Broadcasts SIGCONT then SIGTERM. The continue comes first so that a
/// stopped process is running again when the terminate reaches it.
pub fn shutdown(registry: &ProcessRegistry) {
    registry.broadcast(Signal::SIGCONT);
    registry.broadcast(Signal::SIGTERM);
}

/// Waits for children until none remain, reaping every one of them,
/// tracked or not. Reaping any child is mandatory for a process acting
/// as pid 1: orphaned grandchildren reparent to it and must not be left
/// as zombies. Returns the program's exit code once the wait call fails,
/// which is how the kernel tells us no children are left.
pub fn reap_loop(registry: &ProcessRegistry) -> i32 {
    let mut state = SupervisorState::new();

    loop {
        let status = match waitpid(Pid::from_raw(-1), None) {
            Ok(status) => status,
            Err(err) => {
                info!("wait: {}", err);
                return state.exit_code();
            }
        };

        let (pid, reason) = match exit_event(status) {
            Some(event) => event,
            None => continue,
        };

        match observe(registry, &mut state, pid, &reason) {
            Outcome::Orphan => debug!("reaped orphan pid {}", pid),
            Outcome::Shutdown => {
                info!("watched pid {} finished ({}), terminating others", pid, reason);
                shutdown(registry);
            }
            Outcome::Noted => info!("watched pid {} finished ({})", pid, reason),
        }
    }
}

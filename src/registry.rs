use std::sync::RwLock;

use nix::sys::signal::{kill, Signal};
use nix::unistd::{getpid, Pid};

/// How a broadcast resolves its target set. Decided once at startup and
/// never re-checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastMode {
    /// Running as the namespace's init: signal every process except
    /// ourself, so orphans reparented to us receive shutdown signals too.
    All,
    /// Not pid 1 (e.g. running outside a container): signal only the
    /// processes we explicitly spawned.
    TrackedOnly,
}

impl BroadcastMode {
    pub fn detect() -> Self {
        if getpid().as_raw() == 1 {
            BroadcastMode::All
        } else {
            BroadcastMode::TrackedOnly
        }
    }
}

/// The concrete target set a single broadcast will signal.
#[derive(Debug, PartialEq, Eq)]
pub enum Targets {
    /// kill(-1): everything in the namespace we are allowed to signal.
    Everyone,
    /// Exactly the registered pids.
    Pids(Vec<Pid>),
}

/// The set of spawned process ids. Insertion-only: entries are never
/// pruned, since a stale pid is only ever matched while the kernel still
/// reports it as a live child of ours.
pub struct ProcessRegistry {
    mode: BroadcastMode,
    pids: RwLock<Vec<Pid>>,
}

impl ProcessRegistry {
    pub fn new(mode: BroadcastMode) -> Self {
        Self {
            mode,
            pids: RwLock::new(Vec::new()),
        }
    }

    pub fn add(&self, pid: Pid) {
        let mut pids = self.pids.write().expect("poisoned lock in registry::add");
        pids.push(pid);
    }

    pub fn contains(&self, pid: Pid) -> bool {
        let pids = self
            .pids
            .read()
            .expect("poisoned lock in registry::contains");
        pids.iter().any(|p| *p == pid)
    }

    /// Resolves the target set for one broadcast. A snapshot is taken
    /// under the read lock so the send loop below runs unlocked.
    pub fn targets(&self) -> Targets {
        match self.mode {
            BroadcastMode::All => Targets::Everyone,
            BroadcastMode::TrackedOnly => {
                let pids = self
                    .pids
                    .read()
                    .expect("poisoned lock in registry::targets");
                Targets::Pids(pids.clone())
            }
        }
    }

    /// Sends `sig` to every target. A failed send (target already gone,
    /// typically) is logged and must not stop the remaining sends.
    pub fn broadcast(&self, sig: Signal) {
        match self.targets() {
            Targets::Everyone => {
                if let Err(err) = kill(Pid::from_raw(-1), sig) {
                    warn!("error sending {:?} to all processes: {}", sig, err);
                }
            }
            Targets::Pids(pids) => {
                for pid in pids {
                    debug!("sending {:?} to pid {}", sig, pid);
                    if let Err(err) = kill(pid, sig) {
                        warn!("error sending {:?} to pid {}: {}", sig, pid, err);
                    }
                }
            }
        }
    }
}

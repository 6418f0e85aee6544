use std::sync::Arc;
use std::thread;

use nix::sys::signal::{SigSet, Signal};

use crate::registry::ProcessRegistry;

/// Signals forwarded verbatim to the supervised processes.
pub const FORWARDED_SIGNALS: [Signal; 6] = [
    Signal::SIGHUP,
    Signal::SIGINT,
    Signal::SIGTERM,
    Signal::SIGQUIT,
    Signal::SIGUSR1,
    Signal::SIGUSR2,
];

/// Starts the forwarder thread: every forwarded signal received by this
/// process is re-sent to the supervised processes, in arrival order.
///
/// Must be called from the main thread before anything else spawns
/// threads. The mask set here propagates to all threads started after
/// this point, which is what routes the signals to the `sigwait` below.
/// Child processes are unaffected: the standard library resets the
/// signal mask between fork and exec.
pub fn install_forwarder(registry: Arc<ProcessRegistry>) {
    let mut mask = SigSet::empty();
    for sig in &FORWARDED_SIGNALS {
        mask.add(*sig);
    }
    mask.thread_set_mask().expect("unable to set signal mask");

    thread::spawn(move || loop {
        let sig = match mask.wait() {
            Ok(sig) => sig,
            Err(err) => {
                warn!("sigwait failed: {}", err);
                continue;
            }
        };

        info!("{:?}, propagating signal to children", sig);
        registry.broadcast(sig);
    });
}

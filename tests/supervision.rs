//! End-to-end supervision scenarios, driven with real child processes.
//!
//! The reap loop waits on any child of the test process, so every
//! scenario that spawns children takes the CHILDREN lock and drains all
//! of its children before releasing it.

#![cfg(unix)]

#[macro_use]
extern crate lazy_static;

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitStatus};

use nanoinit::reaper::reap_loop;
use nanoinit::registry::{BroadcastMode, ProcessRegistry, Targets};
use nanoinit::run::spawn_all;

lazy_static! {
    static ref CHILDREN: Mutex<()> = Mutex::new(());
}

/// Writes an executable shell script into the temp dir. The supervisor
/// launches bare command paths without arguments, so every test command
/// is a script.
fn script(name: &str, body: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("nanoinit-test-{}-{}", std::process::id(), name));
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("unable to write test script");

    let mut perms = fs::metadata(&path)
        .expect("unable to stat test script")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("unable to chmod test script");

    path
}

fn command(path: &PathBuf) -> String {
    path.to_str().expect("non-utf8 temp path").to_string()
}

#[test]
fn exit_code_of_the_first_watched_process_is_propagated() {
    let _guard = CHILDREN.lock().unwrap_or_else(PoisonError::into_inner);
    let seven = script("exit7", "exit 7");

    let registry = ProcessRegistry::new(BroadcastMode::TrackedOnly);
    spawn_all(&registry, &[command(&seven)]).expect("spawn failed");

    assert_eq!(reap_loop(&registry), 7);

    let _ = fs::remove_file(seven);
}

#[test]
fn signal_killed_process_maps_to_128_plus_signal_number() {
    let _guard = CHILDREN.lock().unwrap_or_else(PoisonError::into_inner);
    let killed = script("kill9", "kill -9 $$");

    let registry = ProcessRegistry::new(BroadcastMode::TrackedOnly);
    spawn_all(&registry, &[command(&killed)]).expect("spawn failed");

    assert_eq!(reap_loop(&registry), 137);

    let _ = fs::remove_file(killed);
}

#[test]
fn first_exit_terminates_the_siblings() {
    let _guard = CHILDREN.lock().unwrap_or_else(PoisonError::into_inner);
    let three = script("exit3", "exit 3");
    let sleeper_b = script("sleep-b", "exec sleep 5");
    let sleeper_c = script("sleep-c", "exec sleep 5");

    let registry = ProcessRegistry::new(BroadcastMode::TrackedOnly);
    spawn_all(
        &registry,
        &[command(&three), command(&sleeper_b), command(&sleeper_c)],
    )
    .expect("spawn failed");

    let start = Instant::now();
    assert_eq!(reap_loop(&registry), 3);

    // The sleepers were signalled away, not waited out.
    assert!(start.elapsed() < Duration::from_secs(5));

    let _ = fs::remove_file(three);
    let _ = fs::remove_file(sleeper_b);
    let _ = fs::remove_file(sleeper_c);
}

#[test]
fn spawn_failure_terminates_what_already_started() {
    let _guard = CHILDREN.lock().unwrap_or_else(PoisonError::into_inner);
    let sleeper = script("sleep-a", "exec sleep 5");

    let registry = ProcessRegistry::new(BroadcastMode::TrackedOnly);
    let err = spawn_all(
        &registry,
        &[
            command(&sleeper),
            String::from("/nonexistent/nanoinit-test-cmd"),
            command(&sleeper),
        ],
    )
    .expect_err("spawn should fail");

    assert!(err.to_string().contains("/nonexistent/nanoinit-test-cmd"));

    // Only the first command was ever started; the third was never
    // attempted.
    let pids = match registry.targets() {
        Targets::Pids(pids) => pids,
        Targets::Everyone => panic!("tracked-only registry targeted everyone"),
    };
    assert_eq!(pids.len(), 1);

    // The started sleeper received CONT then TERM and died of it.
    match waitpid(pids[0], None).expect("waitpid failed") {
        WaitStatus::Signaled(_, sig, _) => assert_eq!(sig, Signal::SIGTERM),
        other => panic!("expected a SIGTERM death, got {:?}", other),
    }

    let _ = fs::remove_file(sleeper);
}

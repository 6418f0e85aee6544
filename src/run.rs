use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::cli::Args;
use crate::error::{Error, Result};
use crate::reaper;
use crate::registry::{BroadcastMode, ProcessRegistry};
use crate::signal;
use nix::unistd::Pid;

fn init_logger(debug: bool) {
    let mut log_builder = env_logger::Builder::new();
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    log_builder
        .format(|buf, r| writeln!(buf, "nanoinit: {}", r.args()))
        .filter(None, level);
    log_builder.init();
}

#[cfg(target_os = "linux")]
fn mount_procfs() -> Result<()> {
    use nix::mount::{mount, MsFlags};

    mount(
        Some("proc"),
        "/proc",
        Some("proc"),
        MsFlags::empty(),
        None::<&str>,
    )
    .map_err(Error::Mount)
}

#[cfg(not(target_os = "linux"))]
fn mount_procfs() -> Result<()> {
    Err(Error::Mount(nix::Error::UnsupportedOperation))
}

/// Launches each command in order, registering every started process.
/// Each command is a bare executable path; no arguments are passed to
/// it. On the first launch failure the already-started processes are
/// continued and terminated, and no further commands are attempted.
pub fn spawn_all(registry: &ProcessRegistry, commands: &[String]) -> Result<()> {
    for cmd in commands {
        match Command::new(cmd)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
        {
            Ok(child) => {
                let pid = Pid::from_raw(child.id() as i32);
                debug!("spawned {} as pid {}", cmd, pid);
                registry.add(pid);
            }
            Err(err) => {
                reaper::shutdown(registry);
                return Err(Error::Spawn(cmd.clone(), err));
            }
        }
    }

    Ok(())
}

/// Supervises the configured commands to completion and returns the
/// process exit code.
pub fn run(args: Args) -> Result<i32> {
    init_logger(args.debug);

    if args.mount_proc {
        mount_procfs()?;
        debug!("mounted /proc");
    }

    let registry = Arc::new(ProcessRegistry::new(BroadcastMode::detect()));

    // The forwarder must be installed before spawning so that a signal
    // arriving during startup is not lost; it broadcasts to whatever is
    // registered at that moment.
    signal::install_forwarder(Arc::clone(&registry));

    spawn_all(&registry, &args.commands)?;

    Ok(reaper::reap_loop(&registry))
}

use std::{env, path::Path, process::Stdio};

use anyhow::{anyhow, Result};
use sysinfo::{get_current_pid, Signal, System};
use tracing::{debug, info};

use crate::daemon::args::TrackerArgs;

use super::daemon_path::to_daemon_path;

/// Stops every process started from the executable at `name`, except this one and its children.
pub fn kill_previous_servers(name: &Path) -> Result<()> {
    let system = System::new_all();
    let current_id = get_current_pid().map_err(|e| anyhow!("Can't get current pid: {e}"))?;
    for (pid, process) in system.processes().iter() {
        if *pid == current_id {
            continue;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            continue;
        }

        if process
            .exe()
            .filter(|v| v.exists())
            .filter(|v| name == *v)
            .is_some()
        {
            info!("Stopping previous tracker {pid}");
            // This will forcefully terminate the process on Windows.
            if process.kill_with(Signal::Term).is_none() {
                process.kill();
            }
            process.wait();
        }
    }
    Ok(())
}

/// Shuts down a running daemon and starts a new detached one with the given tracker options.
pub fn restart_server(app_dir: &Path, tracker: &TrackerArgs) -> Result<()> {
    let daemon_path = to_daemon_path(env::current_exe()?);
    if !daemon_path.exists() {
        return Err(anyhow!(
            "Daemon executable not found at {}",
            daemon_path.display()
        ));
    }
    kill_previous_servers(&daemon_path)?;

    let mut command = std::process::Command::new(&daemon_path);
    command.arg("--force");
    command.arg("--dir");
    command.arg(app_dir);
    command.args(tracker.to_command_args());
    debug!("Spawning {:?}", command);

    #[cfg(feature = "win")]
    {
        use std::os::windows::process::CommandExt;
        use windows::Win32::System::Threading::DETACHED_PROCESS;
        command.creation_flags(DETACHED_PROCESS.0);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());

    #[allow(clippy::zombie_processes)]
    let child = command.spawn()?;
    println!("Tracker started with pid {}", child.id());
    Ok(())
}

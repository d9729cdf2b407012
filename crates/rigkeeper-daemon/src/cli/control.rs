use super::utils::{read_pid, DIM, FAIL, OK, RESET};
use rigkeeper_types::RigResult;
use std::path::Path;

/// What the running daemon should do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DaemonSignal {
    Stop,
    Kill,
    Reload,
    Recover,
}

impl DaemonSignal {
    fn name(self) -> &'static str {
        match self {
            DaemonSignal::Stop => "SIGTERM",
            DaemonSignal::Kill => "SIGKILL",
            DaemonSignal::Reload => "SIGHUP",
            DaemonSignal::Recover => "SIGUSR1",
        }
    }

    fn effect(self) -> &'static str {
        match self {
            DaemonSignal::Stop => "daemon will stop the miner and exit",
            DaemonSignal::Kill => "daemon killed",
            DaemonSignal::Reload => "config will be reloaded",
            DaemonSignal::Recover => "watchdog will clear its fatal state and relaunch",
        }
    }
}

pub fn stop_daemon(pid_file: &Path, force: bool) -> RigResult<()> {
    let signal = if force { DaemonSignal::Kill } else { DaemonSignal::Stop };
    signal_daemon(pid_file, signal)
}

pub fn reload_daemon(pid_file: &Path) -> RigResult<()> {
    signal_daemon(pid_file, DaemonSignal::Reload)
}

pub fn recover_daemon(pid_file: &Path) -> RigResult<()> {
    signal_daemon(pid_file, DaemonSignal::Recover)
}

fn signal_daemon(pid_file: &Path, signal: DaemonSignal) -> RigResult<()> {
    let Some(pid) = read_pid(pid_file)? else {
        println!("{}No PID file found. Daemon may not be running.{}", DIM, RESET);
        return Ok(());
    };

    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let raw = match signal {
            DaemonSignal::Stop => Signal::SIGTERM,
            DaemonSignal::Kill => Signal::SIGKILL,
            DaemonSignal::Reload => Signal::SIGHUP,
            DaemonSignal::Recover => Signal::SIGUSR1,
        };
        match kill(Pid::from_raw(pid), raw) {
            Ok(()) => println!(
                "{}[+]{} Sent {} to process {} - {}",
                OK,
                RESET,
                signal.name(),
                pid,
                signal.effect()
            ),
            Err(e) => println!("{}[-]{} Failed to signal process {}: {}", FAIL, RESET, pid, e),
        }
    }

    #[cfg(not(unix))]
    {
        println!(
            "{} is not supported on this platform. Signal process {} manually.",
            signal.name(),
            pid
        );
    }

    Ok(())
}

use super::utils::{load_config, print_banner, ACCENT, DIM, OK, RESET};
use rigkeeper_daemon::{AutomationSettings, DaemonConfig, ServiceConfig, ServiceDeps, ServiceManager};
use rigkeeper_miner::{MinerSupervisor, StartOutcome};
use rigkeeper_types::{RigError, RigResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

enum ControlSignal {
    Shutdown,
    Reload,
    Recover,
}

pub async fn run_daemon(
    config: DaemonConfig,
    config_path: &Path,
    data_dir_flag: Option<&PathBuf>,
    pid_file: Option<PathBuf>,
    systemd: bool,
) -> RigResult<()> {
    print_banner();
    info!("Starting rigkeeper v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", config.data_dir);

    std::fs::create_dir_all(&config.data_dir)
        .map_err(|e| RigError::Config(format!("Failed to create data directory: {}", e)))?;

    let pid_path = pid_file.unwrap_or_else(|| config.pid_path());
    std::fs::write(&pid_path, std::process::id().to_string())
        .map_err(|e| RigError::Config(format!("Failed to write PID file: {}", e)))?;
    info!("PID file written: {:?}", pid_path);

    config.log_warnings();

    let mut signals = Signals::install()?;
    let supervisor = Arc::new(MinerSupervisor::with_os_spawner(config.supervisor_config()));
    let deps = ServiceDeps::from_config(&config, supervisor.clone());
    let defer_to_schedule = auto_start(&config, &deps, &supervisor).await;

    let mut services = ServiceManager::new();
    services
        .start_all(
            deps,
            ServiceConfig {
                stats_poller: true,
                defer_to_schedule,
            },
        )
        .await?;
    info!("Services started");

    if systemd {
        notify_systemd_ready();
    }

    print_ready_message(&config);

    loop {
        match signals.next().await? {
            ControlSignal::Shutdown => break,
            ControlSignal::Recover => services.request_recover(),
            ControlSignal::Reload => match load_config(config_path, data_dir_flag) {
                Ok(reloaded) => {
                    reloaded.log_warnings();
                    services.reload(AutomationSettings::from_config(&reloaded));
                }
                Err(e) => error!("Reload failed, keeping current settings: {}", e),
            },
        }
    }

    info!("Shutting down...");
    services.stop_all().await;
    if let Err(e) = supervisor.stop().await {
        warn!("Miner did not stop cleanly: {}", e);
    }

    if let Err(e) = std::fs::remove_file(&pid_path) {
        warn!("Failed to remove PID file {:?}: {}", pid_path, e);
    }

    info!("Shutdown complete");
    Ok(())
}

/// Starts the default session when configured. Returns `true` when the start waits for the mining window.
async fn auto_start(config: &DaemonConfig, deps: &ServiceDeps, supervisor: &MinerSupervisor) -> bool {
    if !config.mining.auto_start {
        return false;
    }

    let session = match config.mining.default_session() {
        Ok(session) => session,
        Err(e) => {
            error!("Auto-start skipped: {}", e);
            return false;
        }
    };

    let settings = deps.watchdog.settings.load();
    if !settings.gate.is_active_at(deps.watchdog.clock.time_of_day()) {
        info!(
            "Outside mining hours ({}); {} starts when the window opens",
            config.automation.mining_hours, session.target
        );
        supervisor.remember(session).await;
        return true;
    }

    match supervisor.start(session).await {
        Ok(StartOutcome::Started { session_id }) => info!("Auto-started miner (session {})", session_id),
        Ok(StartOutcome::AlreadyRunning { session_id }) => info!("Miner already running (session {})", session_id),
        Err(e) => error!("Auto-start failed: {}", e),
    }
    false
}

/// Control signals, installed once for the daemon's lifetime.
#[cfg(unix)]
struct Signals {
    term: tokio::signal::unix::Signal,
    int: tokio::signal::unix::Signal,
    hup: tokio::signal::unix::Signal,
    usr1: tokio::signal::unix::Signal,
}

#[cfg(not(unix))]
struct Signals;

impl Signals {
    #[cfg(unix)]
    fn install() -> RigResult<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let install = |kind: SignalKind, name: &str| {
            signal(kind).map_err(|e| RigError::Internal(format!("Failed to install {} handler: {}", name, e)))
        };
        Ok(Self {
            term: install(SignalKind::terminate(), "SIGTERM")?,
            int: install(SignalKind::interrupt(), "SIGINT")?,
            hup: install(SignalKind::hangup(), "SIGHUP")?,
            usr1: install(SignalKind::user_defined1(), "SIGUSR1")?,
        })
    }

    #[cfg(not(unix))]
    fn install() -> RigResult<Self> {
        Ok(Self)
    }

    #[cfg(unix)]
    async fn next(&mut self) -> RigResult<ControlSignal> {
        let signal = tokio::select! {
            _ = self.term.recv() => { info!("Received SIGTERM"); ControlSignal::Shutdown }
            _ = self.int.recv() => { info!("Received SIGINT"); ControlSignal::Shutdown }
            _ = self.hup.recv() => { info!("Received SIGHUP - reloading config"); ControlSignal::Reload }
            _ = self.usr1.recv() => { info!("Received SIGUSR1 - operator recovery"); ControlSignal::Recover }
        };
        Ok(signal)
    }

    #[cfg(not(unix))]
    async fn next(&mut self) -> RigResult<ControlSignal> {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| RigError::Internal(format!("Failed to wait for Ctrl+C: {}", e)))?;
        info!("Received Ctrl+C");
        Ok(ControlSignal::Shutdown)
    }
}

fn print_ready_message(config: &DaemonConfig) {
    println!();
    println!("{}rigkeeper is now running{}", OK, RESET);
    println!("  Miner dir:  {}{}{}", ACCENT, config.miner_dir().display(), RESET);
    println!("  Status:     {}{}{}", ACCENT, config.status_path().display(), RESET);
    println!(
        "  Watchdog:   {}   Scheduler: {}   Auto-switch: {}",
        on_off(config.automation.watchdog_enabled),
        on_off(config.automation.scheduler_enabled),
        on_off(config.automation.auto_switch_enabled)
    );
    println!("{}  Press Ctrl+C to stop{}", DIM, RESET);
    println!();
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

fn notify_systemd_ready() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(socket_path) = std::env::var("NOTIFY_SOCKET") {
            use std::os::unix::net::UnixDatagram;
            if let Ok(socket) = UnixDatagram::unbound() {
                let _ = socket.send_to(b"READY=1", &socket_path);
                tracing::debug!("Notified systemd: READY=1");
            }
        }
    }
}

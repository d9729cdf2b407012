use super::*;
use crate::adapters::{LogNotifier, NoTelemetry, NullSink, ProfitTable};
use crate::automation::{AutomationSettings, FixedClock, SharedSettings, StatusBoard, WatchdogDeps};
use crate::config::DaemonConfig;
use rigkeeper_miner::testing::ScriptedSpawner;
use rigkeeper_miner::{MinerSupervisor, StatsClient, SupervisorConfig};
use rigkeeper_types::ProcessState;
use std::sync::Arc;
use std::time::Duration;

fn config() -> DaemonConfig {
    let mut config = DaemonConfig::default();
    config.mining.wallet = "addr".into();
    config.mining.worker_name = "rig1".into();
    config
}

fn deps(config: &DaemonConfig) -> (ServiceDeps, ScriptedSpawner) {
    let spawner = ScriptedSpawner::new();
    let supervisor = Arc::new(MinerSupervisor::new(
        SupervisorConfig::new("/opt/miners"),
        Arc::new(spawner.clone()),
    ));
    let deps = ServiceDeps {
        watchdog: WatchdogDeps {
            supervisor,
            telemetry: Arc::new(NoTelemetry),
            notifier: Arc::new(LogNotifier),
            sink: Arc::new(NullSink),
            settings: Arc::new(SharedSettings::new(AutomationSettings::from_config(config))),
            clock: Arc::new(FixedClock::at(12, 0)),
            board: Arc::new(StatusBoard::new()),
        },
        profit: Arc::new(ProfitTable),
        stats: StatsClient::new(),
    };
    (deps, spawner)
}

fn no_poller() -> ServiceConfig {
    ServiceConfig {
        stats_poller: false,
        defer_to_schedule: false,
    }
}

#[tokio::test]
async fn test_service_manager() {
    let manager = ServiceManager::new();
    assert_eq!(manager.get_state(ServiceType::Watchdog).await, ServiceState::Stopped);
    assert_eq!(manager.get_state(ServiceType::Arbiter).await, ServiceState::Stopped);
    assert!(manager.none_failed().await);
}

#[tokio::test(start_paused = true)]
async fn test_start_and_stop_all() {
    let (deps, _spawner) = deps(&config());
    let board = deps.watchdog.board.clone();
    let mut manager = ServiceManager::new();

    manager.start_all(deps, no_poller()).await.expect("start");
    assert_eq!(manager.get_state(ServiceType::Watchdog).await, ServiceState::Running);
    assert_eq!(manager.get_state(ServiceType::Arbiter).await, ServiceState::Running);
    assert_eq!(manager.get_state(ServiceType::StatsPoller).await, ServiceState::Stopped);
    assert!(manager.none_failed().await);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(board.get().last_tick.is_some());

    let started = tokio::time::Instant::now();
    manager.stop_all().await;
    assert!(started.elapsed() < SHUTDOWN_GRACE);
    assert_eq!(manager.get_state(ServiceType::Watchdog).await, ServiceState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_services_restart_after_stop() {
    let config = config();
    let mut manager = ServiceManager::new();

    let (first, _) = deps(&config);
    manager.start_all(first, no_poller()).await.expect("start");
    manager.stop_all().await;

    let (second, _) = deps(&config);
    let board = second.watchdog.board.clone();
    manager.start_all(second, no_poller()).await.expect("restart");
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(board.get().last_tick.is_some());
    manager.stop_all().await;
}

#[tokio::test(start_paused = true)]
async fn test_recover_request_relaunches_remembered_session() {
    let config = config();
    let (deps, spawner) = deps(&config);
    let supervisor = deps.watchdog.supervisor.clone();
    supervisor
        .remember(config.mining.default_session().expect("session"))
        .await;

    let mut manager = ServiceManager::new();
    manager.start_all(deps, no_poller()).await.expect("start");
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(spawner.launches(), 0);

    manager.request_recover();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(spawner.launches(), 1);
    assert_eq!(supervisor.cached_status().state, ProcessState::Running);

    manager.stop_all().await;
}

#[tokio::test]
async fn test_reload_swaps_settings() {
    let mut config = config();
    let (deps, _) = deps(&config);
    let settings = deps.watchdog.settings.clone();
    let mut manager = ServiceManager::new();

    config.automation.hashrate_threshold = 42.0;
    manager.reload(AutomationSettings::from_config(&config));
    assert_eq!(settings.load().automation.hashrate_threshold, 20.0);

    manager.start_all(deps, no_poller()).await.expect("start");
    manager.reload(AutomationSettings::from_config(&config));
    assert_eq!(settings.load().automation.hashrate_threshold, 42.0);
    manager.stop_all().await;
}

#[tokio::test]
async fn test_stats_poller_without_running_miner() {
    let (deps, _) = deps(&config());
    let supervisor = deps.watchdog.supervisor.clone();
    let poller = StatsPoller::new(supervisor.clone(), StatsClient::new(), deps.watchdog.settings.clone());

    assert!(!poller.poll_once().await);
    assert_eq!(supervisor.cached_status().hashrate, 0.0);
}

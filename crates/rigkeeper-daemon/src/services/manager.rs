use super::{CancellationSource, StatsPoller};
use crate::adapters::{
    JsonStatusFile, LogNotifier, NoTelemetry, ProfitTable, ProfitabilitySource, SnapshotFileTelemetry, TelemetrySource,
};
use crate::automation::{
    Arbiter, AutomationSettings, LocalClock, SharedSettings, StatusBoard, Watchdog, WatchdogDeps,
};
use crate::config::DaemonConfig;
use rigkeeper_miner::{MinerSupervisor, StatsClient};
use rigkeeper_types::RigResult;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How long a task may take to wind down after cancellation before it is aborted.
/// Longer than the miner stop grace so an in-flight stop can finish.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceType {
    Watchdog,
    Arbiter,
    StatsPoller,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    Stopped,
    Running,
    Failed,
}

/// Everything the periodic tasks share.
#[derive(Clone)]
pub struct ServiceDeps {
    pub watchdog: WatchdogDeps,
    pub profit: Arc<dyn ProfitabilitySource>,
    pub stats: StatsClient,
}

impl ServiceDeps {
    /// Wire the default adapters around `supervisor`.
    pub fn from_config(config: &DaemonConfig, supervisor: Arc<MinerSupervisor>) -> Self {
        let telemetry: Arc<dyn TelemetrySource> = match &config.telemetry.snapshot_path {
            Some(path) => Arc::new(SnapshotFileTelemetry::new(
                path.clone(),
                Duration::from_secs(config.telemetry.max_age_secs),
            )),
            None => Arc::new(NoTelemetry),
        };

        Self {
            watchdog: WatchdogDeps {
                supervisor,
                telemetry,
                notifier: Arc::new(LogNotifier),
                sink: Arc::new(JsonStatusFile::new(config.status_path())),
                settings: Arc::new(SharedSettings::new(AutomationSettings::from_config(config))),
                clock: Arc::new(LocalClock),
                board: Arc::new(StatusBoard::new()),
            },
            profit: Arc::new(ProfitTable),
            stats: StatsClient::new(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ServiceConfig {
    pub stats_poller: bool,
    /// The remembered session waits for the mining window instead of starting now.
    pub defer_to_schedule: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            stats_poller: true,
            defer_to_schedule: false,
        }
    }
}

pub struct ServiceManager {
    states: Arc<RwLock<HashMap<ServiceType, ServiceState>>>,
    source: CancellationSource,
    handles: Vec<(ServiceType, JoinHandle<()>)>,
    recover: Arc<Notify>,
    deps: Option<ServiceDeps>,
}

impl ServiceManager {
    pub fn new() -> Self {
        let mut states = HashMap::new();
        states.insert(ServiceType::Watchdog, ServiceState::Stopped);
        states.insert(ServiceType::Arbiter, ServiceState::Stopped);
        states.insert(ServiceType::StatsPoller, ServiceState::Stopped);

        let (source, _) = CancellationSource::new();
        Self {
            states: Arc::new(RwLock::new(states)),
            source,
            handles: Vec::new(),
            recover: Arc::new(Notify::new()),
            deps: None,
        }
    }

    pub async fn start_all(&mut self, deps: ServiceDeps, config: ServiceConfig) -> RigResult<()> {
        if self.source.is_cancelled() {
            self.source = CancellationSource::new().0;
        }

        self.start_service(ServiceType::Watchdog, {
            let mut watchdog = Watchdog::new(deps.watchdog.clone());
            if config.defer_to_schedule {
                watchdog.defer_to_schedule();
            }
            let cancel = self.source.token();
            let recover = self.recover.clone();
            async move { watchdog.run(cancel, recover).await }
        })
        .await;

        self.start_service(ServiceType::Arbiter, {
            let arbiter = Arbiter::new(
                deps.watchdog.supervisor.clone(),
                deps.profit.clone(),
                deps.watchdog.notifier.clone(),
                deps.watchdog.settings.clone(),
                deps.watchdog.clock.clone(),
            );
            let cancel = self.source.token();
            async move { arbiter.run(cancel).await }
        })
        .await;

        if config.stats_poller {
            self.start_service(ServiceType::StatsPoller, {
                let poller = StatsPoller::new(
                    deps.watchdog.supervisor.clone(),
                    deps.stats.clone(),
                    deps.watchdog.settings.clone(),
                );
                let cancel = self.source.token();
                async move { poller.run(cancel).await }
            })
            .await;
        }

        self.deps = Some(deps);
        Ok(())
    }

    async fn start_service<F>(&mut self, service_type: ServiceType, task: F)
    where
        F: std::future::Future<Output = RigResult<()>> + Send + 'static,
    {
        // Marked before spawning so a task that fails at once is not overwritten.
        set_state(&self.states, service_type, ServiceState::Running).await;

        let states = self.states.clone();
        let handle = tokio::spawn(async move {
            match task.await {
                Ok(()) => set_state(&states, service_type, ServiceState::Stopped).await,
                Err(e) => {
                    error!("{:?} failed: {}", service_type, e);
                    set_state(&states, service_type, ServiceState::Failed).await;
                }
            }
        });

        self.handles.push((service_type, handle));
        info!("{:?} started", service_type);
    }

    /// Cancel every task, wait for them to finish, abort stragglers.
    pub async fn stop_all(&mut self) {
        self.source.cancel();

        for (service_type, mut handle) in std::mem::take(&mut self.handles) {
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("{:?} task ended abnormally: {}", service_type, e),
                Err(_) => {
                    warn!("{:?} did not stop within {:?}; aborting", service_type, SHUTDOWN_GRACE);
                    handle.abort();
                }
            }
        }

        for state in self.states.write().await.values_mut() {
            *state = ServiceState::Stopped;
        }

        info!("All services stopped");
    }

    /// Wake the watchdog to clear a fatal condition and relaunch.
    pub fn request_recover(&self) {
        info!("Recovery requested");
        self.recover.notify_one();
    }

    /// Swap in reloaded settings; each task picks them up on its next tick.
    pub fn reload(&self, settings: AutomationSettings) {
        match &self.deps {
            Some(deps) => {
                deps.watchdog.settings.replace(settings);
                info!("Automation settings reloaded");
            }
            None => warn!("Reload ignored: services not started"),
        }
    }

    pub async fn get_state(&self, service: ServiceType) -> ServiceState {
        *self
            .states
            .read()
            .await
            .get(&service)
            .unwrap_or(&ServiceState::Stopped)
    }

    /// True while no service has exited with an error. Disabled or stopped services count as healthy.
    pub async fn none_failed(&self) -> bool {
        self.states
            .read()
            .await
            .values()
            .all(|s| *s != ServiceState::Failed)
    }
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn set_state(states: &RwLock<HashMap<ServiceType, ServiceState>>, service: ServiceType, state: ServiceState) {
    states.write().await.insert(service, state);
}

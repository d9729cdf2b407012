use crate::backend::MinerBackend;
use crate::error::{LaunchError, RestartError, StopError};
use crate::session::{session_id_for, SessionConfig, WorkerSession};
use crate::spawner::{OsSpawner, ProcessHandle, ProcessSpawner};
use parking_lot::RwLock;
use rigkeeper_types::{MinerStats, ProcessState, StatusSnapshot};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    pub miner_dir: PathBuf,
    pub stop_grace: Duration,
}

impl SupervisorConfig {
    pub fn new(miner_dir: impl Into<PathBuf>) -> Self {
        Self {
            miner_dir: miner_dir.into(),
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started { session_id: String },
    AlreadyRunning { session_id: String },
}

/// Result of [`MinerSupervisor::switch_from`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched(StartOutcome),
    /// The expected session is no longer the running one; nothing was touched.
    Superseded,
}

/// Where the live session serves its statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsEndpoint {
    pub session_id: String,
    pub backend: MinerBackend,
    pub url: String,
}

impl StartOutcome {
    pub fn session_id(&self) -> &str {
        match self {
            StartOutcome::Started { session_id } | StartOutcome::AlreadyRunning { session_id } => session_id,
        }
    }

    pub fn spawned(&self) -> bool {
        matches!(self, StartOutcome::Started { .. })
    }
}

#[derive(Default)]
struct Inner {
    state: ProcessState,
    process: Option<Box<dyn ProcessHandle>>,
    session: Option<WorkerSession>,
    remembered: Option<SessionConfig>,
    last_session_id: Option<String>,
    sequence: u64,
}

impl Inner {
    fn snapshot(&self) -> StatusSnapshot {
        match &self.session {
            Some(session) => session.snapshot(self.state),
            None => StatusSnapshot {
                state: self.state,
                ..Default::default()
            },
        }
    }
}

/// Owns the single miner process. Every state change goes through one async lock;
/// readers that only need a recent view use [`MinerSupervisor::cached_status`].
pub struct MinerSupervisor {
    config: SupervisorConfig,
    spawner: Arc<dyn ProcessSpawner>,
    inner: Mutex<Inner>,
    published: RwLock<StatusSnapshot>,
    last_error: RwLock<Option<String>>,
}

impl MinerSupervisor {
    pub fn new(config: SupervisorConfig, spawner: Arc<dyn ProcessSpawner>) -> Self {
        Self {
            config,
            spawner,
            inner: Mutex::new(Inner::default()),
            published: RwLock::new(StatusSnapshot::default()),
            last_error: RwLock::new(None),
        }
    }

    pub fn with_os_spawner(config: SupervisorConfig) -> Self {
        Self::new(config, Arc::new(OsSpawner))
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub async fn start(&self, session: SessionConfig) -> Result<StartOutcome, LaunchError> {
        let mut inner = self.inner.lock().await;
        let result = self.start_locked(&mut inner, session).await;
        self.publish(&inner);
        result
    }

    pub async fn stop(&self) -> Result<(), StopError> {
        let mut inner = self.inner.lock().await;
        let result = self.stop_locked(&mut inner).await;
        self.publish(&inner);
        result
    }

    /// Stop (if live) and relaunch the remembered session. No delay between the two.
    pub async fn restart(&self) -> Result<StartOutcome, RestartError> {
        let mut inner = self.inner.lock().await;
        let result = self.restart_locked(&mut inner).await;
        self.publish(&inner);
        result
    }

    /// Replace the running session `expected_session_id` with `session` under one lock
    /// acquisition. If that session was stopped, crashed or replaced since the caller
    /// looked, returns [`SwitchOutcome::Superseded`] without starting anything.
    pub async fn switch_from(
        &self,
        expected_session_id: &str,
        session: SessionConfig,
    ) -> Result<SwitchOutcome, RestartError> {
        let mut inner = self.inner.lock().await;
        self.check_exit_locked(&mut inner);

        let current = inner.session.as_ref().map(|s| s.session_id.as_str());
        if inner.state != ProcessState::Running || current != Some(expected_session_id) {
            info!(
                "Not switching to {}: session {} is no longer running",
                session.target, expected_session_id
            );
            self.publish(&inner);
            return Ok(SwitchOutcome::Superseded);
        }

        let result = match self.stop_locked(&mut inner).await {
            Ok(()) => self
                .start_locked(&mut inner, session)
                .await
                .map(SwitchOutcome::Switched)
                .map_err(RestartError::from),
            Err(e) => Err(RestartError::from(e)),
        };
        self.publish(&inner);
        result
    }

    /// Exit check plus snapshot. A running process that exited on its own becomes `Crashed`.
    pub async fn poll_status(&self) -> StatusSnapshot {
        let mut inner = self.inner.lock().await;
        self.check_exit_locked(&mut inner);
        self.publish(&inner);
        inner.snapshot()
    }

    /// Overwrite the live session's counters. Readings taken from an earlier session
    /// are dropped; returns whether the update was applied.
    pub async fn update_throughput(&self, session_id: &str, stats: MinerStats) -> bool {
        let mut inner = self.inner.lock().await;
        let applied = match inner.session.as_mut() {
            Some(session) if session.session_id == session_id => {
                session.stats = stats;
                true
            }
            _ => {
                debug!("Dropping stats for stale session {}", session_id);
                false
            }
        };
        self.publish(&inner);
        applied
    }

    /// Snapshot published after the last locked operation. Never blocks.
    pub fn cached_status(&self) -> StatusSnapshot {
        self.published.read().clone()
    }

    pub async fn remembered_session(&self) -> Option<SessionConfig> {
        self.inner.lock().await.remembered.clone()
    }

    /// Record launch parameters for a later `restart` without starting anything.
    pub async fn remember(&self, session: SessionConfig) {
        self.inner.lock().await.remembered = Some(session);
    }

    /// Local stats URL of the running session.
    pub async fn stats_endpoint(&self) -> Option<StatsEndpoint> {
        let inner = self.inner.lock().await;
        if inner.state != ProcessState::Running {
            return None;
        }
        inner.session.as_ref().map(|s| StatsEndpoint {
            session_id: s.session_id.clone(),
            backend: s.config.backend,
            url: s.config.backend.stats_url(),
        })
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn check_exit_locked(&self, inner: &mut Inner) {
        if inner.state != ProcessState::Running {
            return;
        }
        let Some(process) = inner.process.as_mut() else {
            return;
        };
        match process.try_wait() {
            Ok(Some(exit)) => {
                let target = inner.session.as_ref().map(|s| s.config.target.clone());
                warn!(
                    "Miner for {} exited unexpectedly (code {:?})",
                    target.as_deref().unwrap_or("unknown"),
                    exit.code
                );
                inner.state = ProcessState::Crashed;
                inner.process = None;
                *self.last_error.write() = Some(match exit.code {
                    Some(code) => format!("miner exited with code {}", code),
                    None => "miner terminated by signal".to_string(),
                });
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to check miner process status: {}", e),
        }
    }

    async fn start_locked(&self, inner: &mut Inner, config: SessionConfig) -> Result<StartOutcome, LaunchError> {
        if inner.state.is_live() {
            if let Some(session) = &inner.session {
                info!("Miner already running for {}", session.config.target);
                return Ok(StartOutcome::AlreadyRunning {
                    session_id: session.session_id.clone(),
                });
            }
        }

        // A crashed handle may still be around; make sure it is gone before spawning.
        if let Some(mut stale) = inner.process.take() {
            if let Err(e) = stale.terminate(self.config.stop_grace).await {
                warn!("Failed to clean up previous miner process: {}", e);
            }
        }

        inner.remembered = Some(config.clone());
        inner.state = ProcessState::Starting;

        let spec = config.backend.launch_spec(&self.config.miner_dir, &config);
        info!("Starting {} for {} on {}", config.backend, config.target, config.pool);

        match self.spawner.launch(&spec).await {
            Ok(process) => {
                inner.sequence += 1;
                let session_id = session_id_for(&config.target, inner.last_session_id.as_deref(), inner.sequence);
                inner.last_session_id = Some(session_id.clone());
                inner.process = Some(process);
                inner.session = Some(WorkerSession::new(config, session_id.clone()));
                inner.state = ProcessState::Running;
                *self.last_error.write() = None;
                info!("Miner running (session {})", session_id);
                Ok(StartOutcome::Started { session_id })
            }
            Err(e) => {
                error!("Failed to start miner: {}", e);
                inner.process = None;
                inner.session = None;
                inner.state = ProcessState::Error;
                *self.last_error.write() = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn stop_locked(&self, inner: &mut Inner) -> Result<(), StopError> {
        let result = match inner.process.take() {
            Some(mut process) => {
                info!("Stopping miner (pid {:?})", process.pid());
                process.terminate(self.config.stop_grace).await
            }
            None => Ok(()),
        };

        if let Err(e) = &result {
            error!("Miner did not stop cleanly: {}", e);
            *self.last_error.write() = Some(e.to_string());
        }

        inner.session = None;
        inner.state = ProcessState::Stopped;
        result
    }

    async fn restart_locked(&self, inner: &mut Inner) -> Result<StartOutcome, RestartError> {
        let config = inner.remembered.clone().ok_or(RestartError::NoActiveSession)?;
        info!("Restarting miner for {}", config.target);
        self.stop_locked(inner).await?;
        Ok(self.start_locked(inner, config).await?)
    }

    fn publish(&self, inner: &Inner) {
        *self.published.write() = inner.snapshot();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSpawner;

    fn session(target: &str) -> SessionConfig {
        SessionConfig {
            target: target.into(),
            algorithm: "kawpow".into(),
            pool: "pool.example:3333".into(),
            credential: "addr".into(),
            worker_label: "rig1".into(),
            backend: MinerBackend::TRex,
        }
    }

    fn supervisor() -> (MinerSupervisor, ScriptedSpawner) {
        let spawner = ScriptedSpawner::new();
        let sup = MinerSupervisor::new(SupervisorConfig::new("/opt/miners"), Arc::new(spawner.clone()));
        (sup, spawner)
    }

    #[tokio::test]
    async fn test_start_twice_spawns_once() {
        let (sup, spawner) = supervisor();

        let first = sup.start(session("RVN")).await.expect("first start");
        assert!(first.spawned());

        let second = sup.start(session("RVN")).await.expect("second start");
        assert_eq!(
            second,
            StartOutcome::AlreadyRunning {
                session_id: first.session_id().to_string()
            }
        );
        assert_eq!(spawner.launches(), 1);
        assert_eq!(spawner.live_processes(), 1);
    }

    #[tokio::test]
    async fn test_start_reports_running_snapshot() {
        let (sup, spawner) = supervisor();
        sup.start(session("RVN")).await.expect("start");

        let status = sup.poll_status().await;
        assert_eq!(status.state, ProcessState::Running);
        assert_eq!(status.target.as_deref(), Some("RVN"));
        assert_eq!(status.pool.as_deref(), Some("pool.example:3333"));
        assert!(status.session_id.as_deref().is_some_and(|id| id.starts_with("RVN_")));
        assert_eq!(sup.cached_status(), status);

        let spec = spawner.last_spec().expect("spec");
        assert_eq!(spec.working_dir, PathBuf::from("/opt/miners"));
        assert_eq!(spec.args[0], "-a");
    }

    #[tokio::test]
    async fn test_exit_detected_as_crash() {
        let (sup, spawner) = supervisor();
        sup.start(session("ERG")).await.expect("start");

        spawner.crash_current();
        let status = sup.poll_status().await;
        assert_eq!(status.state, ProcessState::Crashed);
        assert_eq!(status.target.as_deref(), Some("ERG"));
        assert_eq!(status.uptime_secs, 0);
        assert!(sup.last_error().is_some_and(|e| e.contains("code 1")));

        // Stays crashed until someone acts.
        assert_eq!(sup.poll_status().await.state, ProcessState::Crashed);
    }

    #[tokio::test]
    async fn test_restart_without_session() {
        let (sup, spawner) = supervisor();
        assert_eq!(sup.restart().await, Err(RestartError::NoActiveSession));
        assert_eq!(spawner.launches(), 0);
    }

    #[tokio::test]
    async fn test_restart_after_crash_reuses_session() {
        let (sup, spawner) = supervisor();
        sup.start(session("RVN")).await.expect("start");
        spawner.crash_current();
        sup.poll_status().await;

        let outcome = sup.restart().await.expect("restart");
        assert!(outcome.spawned());
        assert_eq!(spawner.launches(), 2);
        assert_eq!(spawner.live_processes(), 1);
        assert_eq!(sup.cached_status().state, ProcessState::Running);
        assert_eq!(sup.cached_status().target.as_deref(), Some("RVN"));
    }

    #[tokio::test]
    async fn test_stop_clears_session_but_remembers_config() {
        let (sup, spawner) = supervisor();
        let started = sup.start(session("RVN")).await.expect("start");
        assert!(
            sup.update_throughput(started.session_id(), MinerStats { hashrate: 21.0, accepted: 3, rejected: 0 })
                .await
        );
        assert_eq!(sup.cached_status().hashrate, 21.0);

        sup.stop().await.expect("stop");
        let status = sup.cached_status();
        assert_eq!(status.state, ProcessState::Stopped);
        assert_eq!(status.session_id, None);
        assert_eq!(status.target, None);
        assert_eq!(spawner.live_processes(), 0);
        assert_eq!(sup.remembered_session().await, Some(session("RVN")));

        // Stopping again is a no-op.
        sup.stop().await.expect("second stop");
    }

    #[tokio::test]
    async fn test_missing_executable_sets_error() {
        let (sup, spawner) = supervisor();
        spawner.set_missing_executable(true);

        let err = sup.start(session("RVN")).await.expect_err("start should fail");
        assert!(matches!(err, LaunchError::ExecutableNotFound(_)));
        assert_eq!(sup.cached_status().state, ProcessState::Error);
        assert!(sup.last_error().is_some());
        assert_eq!(sup.stats_endpoint().await, None);
    }

    #[tokio::test]
    async fn test_switch_from_replaces_session() {
        let (sup, spawner) = supervisor();
        let started = sup.start(session("RVN")).await.expect("start");

        let mut next = session("ERG");
        next.backend = MinerBackend::LolMiner;
        let outcome = sup.switch_from(started.session_id(), next.clone()).await.expect("switch");

        assert!(matches!(outcome, SwitchOutcome::Switched(StartOutcome::Started { .. })));
        assert_eq!(spawner.launches(), 2);
        assert_eq!(spawner.live_processes(), 1);
        assert_eq!(sup.cached_status().target.as_deref(), Some("ERG"));
        assert_eq!(sup.remembered_session().await, Some(next));

        let endpoint = sup.stats_endpoint().await.expect("endpoint");
        assert_eq!(endpoint.backend, MinerBackend::LolMiner);
        assert_eq!(endpoint.url, "http://127.0.0.1:4068");
        assert_ne!(endpoint.session_id, started.session_id());
    }

    #[tokio::test]
    async fn test_switch_from_stopped_session_starts_nothing() {
        let (sup, spawner) = supervisor();
        let started = sup.start(session("RVN")).await.expect("start");
        sup.stop().await.expect("stop");

        let outcome = sup.switch_from(started.session_id(), session("ERG")).await.expect("switch");
        assert_eq!(outcome, SwitchOutcome::Superseded);
        assert_eq!(spawner.launches(), 1);
        assert_eq!(spawner.live_processes(), 0);
        assert_eq!(sup.cached_status().state, ProcessState::Stopped);
        assert_eq!(sup.remembered_session().await, Some(session("RVN")));
    }

    #[tokio::test]
    async fn test_switch_from_undetected_crash_is_superseded() {
        let (sup, spawner) = supervisor();
        let started = sup.start(session("RVN")).await.expect("start");
        spawner.crash_current();

        let outcome = sup.switch_from(started.session_id(), session("ERG")).await.expect("switch");
        assert_eq!(outcome, SwitchOutcome::Superseded);
        assert_eq!(spawner.launches(), 1);
        assert_eq!(sup.cached_status().state, ProcessState::Crashed);
    }

    #[tokio::test]
    async fn test_switch_from_replaced_session_is_superseded() {
        let (sup, spawner) = supervisor();
        let first = sup.start(session("RVN")).await.expect("start");
        sup.restart().await.expect("restart");

        let outcome = sup.switch_from(first.session_id(), session("ERG")).await.expect("switch");
        assert_eq!(outcome, SwitchOutcome::Superseded);
        assert_eq!(spawner.launches(), 2);
        assert_eq!(sup.cached_status().target.as_deref(), Some("RVN"));
    }

    #[tokio::test]
    async fn test_failed_switch_launch_leaves_error() {
        let (sup, spawner) = supervisor();
        let started = sup.start(session("RVN")).await.expect("start");
        spawner.fail_next_launch(LaunchError::Spawn("permission denied".into()));

        let err = sup
            .switch_from(started.session_id(), session("ERG"))
            .await
            .expect_err("switch should fail");
        assert!(matches!(err, RestartError::Launch(LaunchError::Spawn(_))));
        assert_eq!(spawner.live_processes(), 0);
        assert_eq!(sup.cached_status().state, ProcessState::Error);
        assert!(sup.last_error().is_some_and(|e| e.contains("permission denied")));
    }

    #[tokio::test]
    async fn test_stale_throughput_is_dropped() {
        let (sup, _spawner) = supervisor();
        let first = sup.start(session("RVN")).await.expect("start");
        let endpoint = sup.stats_endpoint().await.expect("endpoint");
        assert_eq!(endpoint.session_id, first.session_id());

        sup.restart().await.expect("restart");
        let applied = sup
            .update_throughput(&endpoint.session_id, MinerStats { hashrate: 30.0, accepted: 9, rejected: 1 })
            .await;

        assert!(!applied);
        let status = sup.cached_status();
        assert_eq!(status.hashrate, 0.0);
        assert_eq!(status.accepted, 0);
    }

    #[tokio::test]
    async fn test_stop_passes_configured_grace() {
        let spawner = ScriptedSpawner::new();
        let mut config = SupervisorConfig::new("/opt/miners");
        config.stop_grace = Duration::from_secs(3);
        let sup = MinerSupervisor::new(config, Arc::new(spawner.clone()));

        sup.start(session("RVN")).await.expect("start");
        sup.stop().await.expect("stop");
        assert_eq!(spawner.last_grace(), Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn test_concurrent_starts_spawn_one_process() {
        let (sup, spawner) = supervisor();
        let sup = Arc::new(sup);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sup = sup.clone();
                tokio::spawn(async move { sup.start(session("RVN")).await })
            })
            .collect();
        for handle in handles {
            handle.await.expect("join").expect("start");
        }

        assert_eq!(spawner.launches(), 1);
        assert_eq!(spawner.live_processes(), 1);
    }
}

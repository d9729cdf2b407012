use super::alerts;
use super::policy::{LowThroughputTracker, RestartDecision, RestartPolicy};
use super::schedule::Clock;
use super::settings::{AutomationSettings, SharedSettings};
use super::status::{AutomationStatus, HealthSnapshot, StatusBoard};
use crate::adapters::{Notifier, StatusSink, TelemetrySource};
use crate::services::CancellationToken;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use rigkeeper_miner::{MinerSupervisor, StartOutcome};
use rigkeeper_types::{Alert, AlertSeverity, DeviceReading, ProcessState, RigError, RigResult, StatusSnapshot};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// How a tick ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickFlow {
    Completed,
    Cancelled,
}

/// Collaborators the watchdog observes and acts through.
#[derive(Clone)]
pub struct WatchdogDeps {
    pub supervisor: Arc<MinerSupervisor>,
    pub telemetry: Arc<dyn TelemetrySource>,
    pub notifier: Arc<dyn Notifier>,
    pub sink: Arc<dyn StatusSink>,
    pub settings: Arc<SharedSettings>,
    pub clock: Arc<dyn Clock>,
    pub board: Arc<StatusBoard>,
}

/// Periodic health control loop: crash recovery, low-hashrate restarts,
/// thermal alerts and mining-hours enforcement.
pub struct Watchdog {
    deps: WatchdogDeps,
    policy: RestartPolicy,
    tracker: LowThroughputTracker,
    alerted_crash: Option<String>,
    fatal_reason: Option<String>,
    last_restart_wall: Option<DateTime<Utc>>,
    stopped_by_schedule: bool,
}

impl Watchdog {
    pub fn new(deps: WatchdogDeps) -> Self {
        let restart = deps.settings.load().automation.restart;
        Self {
            deps,
            policy: RestartPolicy::new(restart),
            tracker: LowThroughputTracker::new(),
            alerted_crash: None,
            fatal_reason: None,
            last_restart_wall: None,
            stopped_by_schedule: false,
        }
    }

    /// Let the schedule start the remembered session when the window next opens.
    pub fn defer_to_schedule(&mut self) {
        self.stopped_by_schedule = true;
    }

    pub fn policy(&self) -> &RestartPolicy {
        &self.policy
    }

    pub fn status(&self) -> AutomationStatus {
        self.deps.board.get()
    }

    pub async fn run(mut self, mut cancel: CancellationToken, recover: Arc<Notify>) -> RigResult<()> {
        info!("Watchdog running");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match AssertUnwindSafe(self.tick(&mut cancel)).catch_unwind().await {
                Ok(TickFlow::Completed) => {}
                Ok(TickFlow::Cancelled) => break,
                Err(panic) => error!("Watchdog tick panicked: {}", panic_message(&*panic)),
            }

            let interval = self.deps.settings.load().check_interval();
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = recover.notified() => {
                    if let Err(e) = self.recover().await {
                        error!("Operator recovery failed: {}", e);
                    }
                }
                _ = cancel.cancelled() => break,
            }
        }

        info!("Watchdog shutting down");
        Ok(())
    }

    pub async fn tick(&mut self, cancel: &mut CancellationToken) -> TickFlow {
        let settings = self.deps.settings.load();
        self.policy.set_config(settings.automation.restart);

        let supposed = settings.gate.is_active_at(self.deps.clock.time_of_day());
        let status = self.deps.supervisor.poll_status().await;
        let telemetry = self.deps.telemetry.latest_snapshot().await;
        let devices = telemetry.map(|t| t.devices).unwrap_or_default();

        debug!(
            "Watchdog tick: state={} hashrate={:.2} scheduled={} devices={}",
            status.state,
            status.hashrate,
            supposed,
            devices.len()
        );

        if settings.automation.watchdog_enabled {
            if status.state == ProcessState::Crashed && status.target.is_some() {
                if self.handle_crash(&status, supposed, cancel).await == TickFlow::Cancelled {
                    return TickFlow::Cancelled;
                }
            }

            self.check_throughput(&settings, &status, supposed).await;
            self.check_thermal(&settings, &devices).await;
        }

        if settings.gate.enabled() {
            self.enforce_schedule(supposed).await;
        }

        let health = HealthSnapshot {
            process_state: status.state,
            hashrate: status.hashrate,
            supposed_to_be_running: supposed,
            devices,
            timestamp: Utc::now(),
        };
        self.publish(&health, supposed);

        TickFlow::Completed
    }

    /// Clear the fatal condition and relaunch the remembered session.
    pub async fn recover(&mut self) -> RigResult<StartOutcome> {
        info!("Operator recovery requested");
        self.policy.reset();
        self.tracker.reset();
        self.fatal_reason = None;
        self.alerted_crash = None;
        self.stopped_by_schedule = false;

        let outcome = self.deps.supervisor.restart().await.map_err(RigError::from)?;
        let status = self.deps.supervisor.cached_status();
        if let (Some(target), Some(pool)) = (&status.target, &status.pool) {
            self.notify(alerts::mining_started(target, pool)).await;
        }

        let supposed = self
            .deps
            .settings
            .load()
            .gate
            .is_active_at(self.deps.clock.time_of_day());
        self.publish_status(supposed);
        Ok(outcome)
    }

    async fn handle_crash(&mut self, status: &StatusSnapshot, supposed: bool, cancel: &mut CancellationToken) -> TickFlow {
        let target = status.target.clone().unwrap_or_default();
        let decision = supposed.then(|| self.policy.decide(Instant::now()));

        let crash_key = status.session_id.clone().unwrap_or_else(|| target.clone());
        if self.alerted_crash.as_deref() != Some(crash_key.as_str()) {
            let action = match decision {
                None => "restart deferred until mining hours",
                Some(RestartDecision::Restart { .. }) => "attempting auto-restart",
                Some(RestartDecision::Exhausted { .. }) => "manual intervention required",
            };
            warn!("Miner for {} crashed ({})", target, action);
            self.notify(alerts::miner_crashed(&target, action)).await;
            self.alerted_crash = Some(crash_key);
        }

        match decision {
            None => {
                debug!("Crash recovery suppressed outside mining hours");
            }
            Some(RestartDecision::Exhausted { attempts }) => {
                if self.fatal_reason.is_none() {
                    let reason = RigError::RestartAttemptsExhausted { attempts }.to_string();
                    error!("{}", reason);
                    self.fatal_reason = Some(reason);
                }
            }
            Some(RestartDecision::Restart { attempt, delay }) => {
                self.fatal_reason = None;
                info!(
                    "Restarting {} in {}s (attempt {}/{})",
                    target,
                    delay.as_secs(),
                    attempt,
                    self.policy.config().max_attempts
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => {
                        info!("Shutdown during restart backoff; restart abandoned");
                        return TickFlow::Cancelled;
                    }
                }

                match self.deps.supervisor.restart().await {
                    Ok(outcome) => info!("Miner restarted (session {})", outcome.session_id()),
                    Err(e) => error!("Automatic restart failed: {}", e),
                }
                self.policy.record_restart(Instant::now());
                self.last_restart_wall = Some(Utc::now());
            }
        }

        TickFlow::Completed
    }

    async fn check_throughput(&mut self, settings: &AutomationSettings, status: &StatusSnapshot, supposed: bool) {
        if status.state != ProcessState::Running {
            self.tracker.reset();
            return;
        }

        if Duration::from_secs(status.uptime_secs) < settings.low_hashrate_grace() {
            self.tracker.reset();
            return;
        }

        let threshold = settings.automation.hashrate_threshold;
        if !self.tracker.observe(status.hashrate, threshold) {
            return;
        }

        let target = status.target.as_deref().unwrap_or("unknown");
        warn!(
            "Hashrate for {} below threshold ({:.2} < {:.2})",
            target, status.hashrate, threshold
        );
        self.notify(alerts::low_hashrate(target, status.hashrate, threshold)).await;

        if !supposed {
            return;
        }

        match self.deps.supervisor.restart().await {
            Ok(outcome) => info!("Miner restarted after low hashrate (session {})", outcome.session_id()),
            Err(e) => error!("Restart after low hashrate failed: {}", e),
        }
    }

    async fn check_thermal(&mut self, settings: &AutomationSettings, devices: &[DeviceReading]) {
        let warning = settings.automation.warning_temperature;
        let critical = settings.automation.critical_temperature;
        let mut critical_seen = false;

        for device in devices {
            if device.temperature >= critical {
                error!("Device {} at {:.1}C (critical)", device.id, device.temperature);
                self.notify(alerts::high_temperature(device.id, device.temperature, AlertSeverity::Critical))
                    .await;
                critical_seen = true;
            } else if device.temperature >= warning {
                warn!("Device {} at {:.1}C", device.id, device.temperature);
                self.notify(alerts::high_temperature(device.id, device.temperature, AlertSeverity::Warning))
                    .await;
            }
        }

        if !critical_seen || !settings.automation.emergency_stop_on_critical {
            return;
        }

        let status = self.deps.supervisor.cached_status();
        if !status.state.is_live() {
            return;
        }

        error!("Emergency stop: critical device temperature");
        if let Err(e) = self.deps.supervisor.stop().await {
            error!("Emergency stop did not complete cleanly: {}", e);
        }
        self.stopped_by_schedule = false;
        if let Some(target) = &status.target {
            self.notify(alerts::mining_stopped(target, status.uptime_secs, "thermal")).await;
        }
    }

    async fn enforce_schedule(&mut self, supposed: bool) {
        let status = self.deps.supervisor.cached_status();

        if !supposed && status.state == ProcessState::Running {
            info!("Outside mining hours; stopping miner");
            if let Err(e) = self.deps.supervisor.stop().await {
                error!("Scheduled stop did not complete cleanly: {}", e);
            }
            self.stopped_by_schedule = true;
            if let Some(target) = &status.target {
                self.notify(alerts::mining_stopped(target, status.uptime_secs, "schedule")).await;
            }
            return;
        }

        if supposed && status.state == ProcessState::Stopped && self.stopped_by_schedule {
            let Some(session) = self.deps.supervisor.remembered_session().await else {
                return;
            };

            info!("Mining hours started; resuming {}", session.target);
            self.stopped_by_schedule = false;
            match self.deps.supervisor.start(session.clone()).await {
                Ok(_) => self.notify(alerts::mining_started(&session.target, &session.pool)).await,
                Err(e) => error!("Scheduled start failed: {}", e),
            }
        }
    }

    async fn notify(&self, alert: Alert) {
        if let Err(e) = self.deps.notifier.alert(alert).await {
            warn!("Alert delivery failed: {}", e);
        }
    }

    fn publish(&self, health: &HealthSnapshot, supposed: bool) {
        let status = self.publish_status(supposed);
        self.deps
            .sink
            .record(health, &status, &self.deps.supervisor.cached_status());
    }

    fn publish_status(&self, supposed: bool) -> AutomationStatus {
        let status = AutomationStatus {
            restart_attempts: self.policy.attempts(),
            last_restart_at: self.last_restart_wall,
            restarts_exhausted: self.fatal_reason.is_some(),
            fatal_reason: self.fatal_reason.clone(),
            consecutive_low_readings: self.tracker.consecutive(),
            last_tick: Some(Utc::now()),
            schedule_active: supposed,
        };
        self.deps.board.publish(status.clone());
        status
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

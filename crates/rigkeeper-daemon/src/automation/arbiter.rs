use super::alerts;
use super::schedule::Clock;
use super::settings::SharedSettings;
use crate::adapters::{Notifier, ProfitabilitySource};
use crate::services::CancellationToken;
use rigkeeper_miner::{MinerSupervisor, SwitchOutcome};
use rigkeeper_types::{ProcessState, RigResult};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of one profitability evaluation.
#[derive(Clone, Debug, PartialEq)]
pub enum ArbiterDecision {
    Disabled,
    OutsideSchedule,
    NotRunning,
    NoEstimate,
    AlreadyBest,
    BelowMargin { best: String, gain: f64 },
    Switched { from: String, to: String },
    SwitchFailed { to: String, reason: String },
}

/// Periodically moves the rig to the most profitable coin, with a margin against thrash.
pub struct Arbiter {
    supervisor: Arc<MinerSupervisor>,
    profit: Arc<dyn ProfitabilitySource>,
    notifier: Arc<dyn Notifier>,
    settings: Arc<SharedSettings>,
    clock: Arc<dyn Clock>,
}

impl Arbiter {
    pub fn new(
        supervisor: Arc<MinerSupervisor>,
        profit: Arc<dyn ProfitabilitySource>,
        notifier: Arc<dyn Notifier>,
        settings: Arc<SharedSettings>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            supervisor,
            profit,
            notifier,
            settings,
            clock,
        }
    }

    pub async fn run(self, mut cancel: CancellationToken) -> RigResult<()> {
        info!("Profit arbiter running");

        loop {
            let interval = self.settings.load().profit_check_interval();
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => break,
            }

            let decision = self.evaluate().await;
            debug!("Profit check: {:?}", decision);
        }

        info!("Profit arbiter shutting down");
        Ok(())
    }

    pub async fn evaluate(&self) -> ArbiterDecision {
        let settings = self.settings.load();
        let automation = &settings.automation;

        if !automation.auto_switch_enabled {
            return ArbiterDecision::Disabled;
        }

        if !settings.gate.is_active_at(self.clock.time_of_day()) {
            return ArbiterDecision::OutsideSchedule;
        }

        let status = self.supervisor.cached_status();
        let (current, session_id) = match (&status.state, &status.target, &status.session_id) {
            (ProcessState::Running, Some(target), Some(id)) => (target.clone(), id.clone()),
            _ => return ArbiterDecision::NotRunning,
        };

        let coins = &settings.mining.coins;
        let cost = automation.electricity_cost;

        let Some(best) = self.profit.best_target(coins, cost).await else {
            return ArbiterDecision::NoEstimate;
        };

        if best.target == current {
            return ArbiterDecision::AlreadyBest;
        }

        if let Some(estimate) = self.profit.estimate(&current, coins, cost).await {
            let gain = best.daily_profit - estimate.daily_profit;
            if gain < automation.min_switch_margin {
                debug!(
                    "{} beats {} by {:.4}/day, below margin {:.4}",
                    best.target, current, gain, automation.min_switch_margin
                );
                return ArbiterDecision::BelowMargin { best: best.target, gain };
            }
        }

        let worker = self
            .supervisor
            .remembered_session()
            .await
            .map(|s| s.worker_label)
            .unwrap_or_else(|| settings.mining.worker_name.clone());

        let session = match settings.mining.session_for(&best.target, &worker, None) {
            Ok(session) => session,
            Err(e) => {
                error!("Cannot switch to {}: {}", best.target, e);
                return ArbiterDecision::SwitchFailed {
                    to: best.target,
                    reason: e.to_string(),
                };
            }
        };

        info!(
            "Switching {} -> {} ({:.2}/day expected)",
            current, best.target, best.daily_profit
        );

        match self.supervisor.switch_from(&session_id, session.clone()).await {
            Ok(SwitchOutcome::Superseded) => {
                info!("{} stopped during the profit check; not switching", current);
                ArbiterDecision::NotRunning
            }
            Ok(SwitchOutcome::Switched(_)) => {
                self.notify(alerts::mining_stopped(&current, status.uptime_secs, "profit_switch"))
                    .await;
                self.notify(alerts::mining_started(&session.target, &session.pool)).await;
                ArbiterDecision::Switched {
                    from: current,
                    to: session.target,
                }
            }
            Err(e) => {
                error!("Switch to {} failed: {}", session.target, e);
                ArbiterDecision::SwitchFailed {
                    to: session.target,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn notify(&self, alert: rigkeeper_types::Alert) {
        if let Err(e) = self.notifier.alert(alert).await {
            warn!("Alert delivery failed: {}", e);
        }
    }
}

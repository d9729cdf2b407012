use super::schedule::ScheduleGate;
use crate::config::{AutomationConfig, DaemonConfig, MiningConfig};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The slice of configuration the periodic tasks act on.
#[derive(Clone, Debug)]
pub struct AutomationSettings {
    pub automation: AutomationConfig,
    pub mining: MiningConfig,
    pub gate: ScheduleGate,
}

impl AutomationSettings {
    pub fn from_config(config: &DaemonConfig) -> Self {
        Self {
            automation: config.automation.clone(),
            mining: config.mining.clone(),
            gate: ScheduleGate::new(config.automation.scheduler_enabled, &config.automation.mining_hours),
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.automation.check_interval_secs.max(1))
    }

    pub fn profit_check_interval(&self) -> Duration {
        Duration::from_secs(self.automation.profit_check_interval_mins.max(1) * 60)
    }

    pub fn stats_poll_interval(&self) -> Duration {
        Duration::from_secs(self.mining.stats_poll_interval_secs.max(1))
    }

    pub fn low_hashrate_grace(&self) -> Duration {
        Duration::from_secs(self.automation.low_hashrate_grace_secs)
    }
}

/// Settings shared by every task. Tasks take a fresh copy at the start of each tick.
#[derive(Debug)]
pub struct SharedSettings {
    current: RwLock<Arc<AutomationSettings>>,
}

impl SharedSettings {
    pub fn new(settings: AutomationSettings) -> Self {
        Self {
            current: RwLock::new(Arc::new(settings)),
        }
    }

    pub fn load(&self) -> Arc<AutomationSettings> {
        self.current.read().clone()
    }

    pub fn replace(&self, settings: AutomationSettings) {
        *self.current.write() = Arc::new(settings);
        info!("Automation settings reloaded");
    }
}

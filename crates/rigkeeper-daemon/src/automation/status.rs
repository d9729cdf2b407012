use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rigkeeper_types::{DeviceReading, ProcessState};
use serde::{Deserialize, Serialize};

/// What the automation layer reports about itself after each watchdog tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AutomationStatus {
    pub restart_attempts: u32,
    pub last_restart_at: Option<DateTime<Utc>>,
    pub restarts_exhausted: bool,
    pub fatal_reason: Option<String>,
    pub consecutive_low_readings: u32,
    pub last_tick: Option<DateTime<Utc>>,
    pub schedule_active: bool,
}

/// Observations from a single watchdog tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub process_state: ProcessState,
    pub hashrate: f64,
    pub supposed_to_be_running: bool,
    pub devices: Vec<DeviceReading>,
    pub timestamp: DateTime<Utc>,
}

/// Latest published [`AutomationStatus`], readable without touching the watchdog.
#[derive(Debug, Default)]
pub struct StatusBoard {
    current: RwLock<AutomationStatus>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> AutomationStatus {
        self.current.read().clone()
    }

    pub fn publish(&self, status: AutomationStatus) {
        *self.current.write() = status;
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceReading {
    pub id: u32,
    pub temperature: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub devices: Vec<DeviceReading>,
    pub timestamp: DateTime<Utc>,
}

impl TelemetrySnapshot {
    pub fn empty() -> Self {
        Self {
            devices: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn max_temperature(&self) -> Option<f64> {
        self.devices
            .iter()
            .map(|d| d.temperature)
            .fold(None, |acc, t| Some(acc.map_or(t, |m: f64| m.max(t))))
    }
}

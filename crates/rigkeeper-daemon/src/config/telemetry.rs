use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_TELEMETRY_MAX_AGE_SECS: u64 = 60;

/// Where device readings come from. Without a snapshot path the thermal check sees no devices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub snapshot_path: Option<PathBuf>,
    pub max_age_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            max_age_secs: DEFAULT_TELEMETRY_MAX_AGE_SECS,
        }
    }
}

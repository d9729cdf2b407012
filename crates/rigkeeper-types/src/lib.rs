#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod alert;
mod error;
mod miner;
mod telemetry;

pub use alert::{Alert, AlertKind, AlertSeverity};
pub use error::{RigError, RigResult};
pub use miner::{MinerStats, ProcessState, StatusSnapshot};
pub use telemetry::{DeviceReading, TelemetrySnapshot};

/// Working unit for hashrate across the workspace (MH/s).
pub const HASHRATE_UNIT: &str = "MH/s";

pub const DEFAULT_WARNING_TEMPERATURE: f64 = 80.0;

pub const DEFAULT_CRITICAL_TEMPERATURE: f64 = 85.0;

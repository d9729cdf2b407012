use async_trait::async_trait;
use rigkeeper_types::{RigError, RigResult, TelemetrySnapshot};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Latest per-device readings. `None` means no usable data this tick.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn latest_snapshot(&self) -> Option<TelemetrySnapshot>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoTelemetry;

#[async_trait]
impl TelemetrySource for NoTelemetry {
    async fn latest_snapshot(&self) -> Option<TelemetrySnapshot> {
        None
    }
}

/// Reads a JSON snapshot written by an external GPU exporter.
#[derive(Debug, Clone)]
pub struct SnapshotFileTelemetry {
    path: PathBuf,
    max_age: Duration,
}

impl SnapshotFileTelemetry {
    pub fn new(path: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            path: path.into(),
            max_age,
        }
    }

    async fn read(&self) -> RigResult<TelemetrySnapshot> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| RigError::Telemetry(format!("{}: {}", self.path.display(), e)))?;

        let snapshot: TelemetrySnapshot = serde_json::from_slice(&bytes)
            .map_err(|e| RigError::Telemetry(format!("{}: {}", self.path.display(), e)))?;

        let age = chrono::Utc::now().signed_duration_since(snapshot.timestamp);
        if age.to_std().map(|a| a > self.max_age).unwrap_or(false) {
            return Err(RigError::Telemetry(format!("snapshot is {}s old", age.num_seconds())));
        }

        Ok(snapshot)
    }
}

#[async_trait]
impl TelemetrySource for SnapshotFileTelemetry {
    async fn latest_snapshot(&self) -> Option<TelemetrySnapshot> {
        match self.read().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }
}

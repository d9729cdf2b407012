use crate::automation::{AutomationStatus, HealthSnapshot};
use rigkeeper_types::{RigError, RigResult, StatusSnapshot};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Passive persistence for each tick's observations. Must not block the caller.
pub trait StatusSink: Send + Sync {
    fn record(&self, health: &HealthSnapshot, automation: &AutomationStatus, miner: &StatusSnapshot);
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusDocument {
    pub miner: StatusSnapshot,
    pub automation: AutomationStatus,
    pub health: Option<HealthSnapshot>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl StatusDocument {
    pub fn load(path: impl AsRef<Path>) -> RigResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| RigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| RigError::Serialization(format!("Invalid status file {}: {}", path.display(), e)))
    }
}

/// Writes `status.json` atomically (temp file + rename) from a spawned task.
#[derive(Debug, Clone)]
pub struct JsonStatusFile {
    path: PathBuf,
}

impl JsonStatusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(path: &Path, document: &StatusDocument) -> RigResult<()> {
        let json = serde_json::to_vec_pretty(document)
            .map_err(|e| RigError::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RigError::Io(e.to_string()))?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| RigError::Io(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| RigError::Io(format!("Failed to replace {}: {}", path.display(), e)))
    }
}

impl StatusSink for JsonStatusFile {
    fn record(&self, health: &HealthSnapshot, automation: &AutomationStatus, miner: &StatusSnapshot) {
        let document = StatusDocument {
            miner: miner.clone(),
            automation: automation.clone(),
            health: Some(health.clone()),
            updated_at: chrono::Utc::now(),
        };
        let path = self.path.clone();

        tokio::spawn(async move {
            if let Err(e) = JsonStatusFile::write(&path, &document).await {
                debug!("Status file not updated: {}", e);
            }
        });
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn record(&self, _: &HealthSnapshot, _: &AutomationStatus, _: &StatusSnapshot) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigkeeper_types::ProcessState;

    #[tokio::test]
    async fn test_write_and_load_status_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("status.json");

        let document = StatusDocument {
            miner: StatusSnapshot {
                state: ProcessState::Running,
                target: Some("RVN".into()),
                hashrate: 15.2,
                ..Default::default()
            },
            automation: AutomationStatus {
                restart_attempts: 2,
                schedule_active: true,
                ..Default::default()
            },
            health: None,
            updated_at: chrono::Utc::now(),
        };

        JsonStatusFile::write(&path, &document).await.expect("write");
        let loaded = StatusDocument::load(&path).expect("load");
        assert_eq!(loaded, document);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_record_writes_in_background() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = JsonStatusFile::new(dir.path().join("status.json"));

        let health = HealthSnapshot {
            process_state: ProcessState::Stopped,
            hashrate: 0.0,
            supposed_to_be_running: false,
            devices: vec![],
            timestamp: chrono::Utc::now(),
        };
        sink.record(&health, &AutomationStatus::default(), &StatusSnapshot::default());

        for _ in 0..50 {
            if sink.path().exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        let loaded = StatusDocument::load(sink.path()).expect("load");
        assert_eq!(loaded.health, Some(health));
    }
}

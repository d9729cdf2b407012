use crate::backend::MinerBackend;
use rigkeeper_types::{MinerStats, ProcessState, StatusSnapshot};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Launch parameters for a session. Remembered across stop so a restart can reuse them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub target: String,
    pub algorithm: String,
    pub pool: String,
    pub credential: String,
    pub worker_label: String,
    pub backend: MinerBackend,
}

#[derive(Clone, Debug)]
pub struct WorkerSession {
    pub config: SessionConfig,
    pub session_id: String,
    pub started_at: Instant,
    pub started_wall: chrono::DateTime<chrono::Utc>,
    pub stats: MinerStats,
}

impl WorkerSession {
    pub fn new(config: SessionConfig, session_id: String) -> Self {
        Self {
            config,
            session_id,
            started_at: Instant::now(),
            started_wall: chrono::Utc::now(),
            stats: MinerStats::default(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn snapshot(&self, state: ProcessState) -> StatusSnapshot {
        StatusSnapshot {
            state,
            target: Some(self.config.target.clone()),
            pool: Some(self.config.pool.clone()),
            uptime_secs: if state == ProcessState::Running { self.uptime_secs() } else { 0 },
            hashrate: self.stats.hashrate,
            accepted: self.stats.accepted,
            rejected: self.stats.rejected,
            session_id: Some(self.session_id.clone()),
        }
    }
}

pub(crate) fn session_id_for(target: &str, previous: Option<&str>, sequence: u64) -> String {
    let id = format!("{}_{}", target, chrono::Utc::now().timestamp());
    if previous == Some(id.as_str()) {
        format!("{}_{}", id, sequence)
    } else {
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_format() {
        let id = session_id_for("RVN", None, 1);
        let (target, epoch) = id.split_once('_').expect("separator");
        assert_eq!(target, "RVN");
        assert!(epoch.parse::<i64>().is_ok());
    }

    #[test]
    fn test_session_id_unique_within_same_second() {
        let first = session_id_for("ERG", None, 1);
        let second = session_id_for("ERG", Some(&first), 2);
        if second.starts_with(&first) {
            assert_eq!(second, format!("{}_2", first));
        }
        assert_ne!(first, second);
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    #[default]
    Stopped,
    Starting,
    Running,
    Crashed,
    Error,
}

impl ProcessState {
    /// A live process may exist in these states.
    pub fn is_live(&self) -> bool {
        matches!(self, ProcessState::Starting | ProcessState::Running)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Stopped => write!(f, "stopped"),
            ProcessState::Starting => write!(f, "starting"),
            ProcessState::Running => write!(f, "running"),
            ProcessState::Crashed => write!(f, "crashed"),
            ProcessState::Error => write!(f, "error"),
        }
    }
}

/// Throughput counters reported by a miner's local API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MinerStats {
    pub hashrate: f64,
    pub accepted: u64,
    pub rejected: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub state: ProcessState,
    pub target: Option<String>,
    pub pool: Option<String>,
    pub uptime_secs: u64,
    pub hashrate: f64,
    pub accepted: u64,
    pub rejected: u64,
    pub session_id: Option<String>,
}

impl StatusSnapshot {
    pub fn is_running(&self) -> bool {
        self.state == ProcessState::Running
    }
}

use rigkeeper_types::RigError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("Miner executable not found at {0:?}. Download the miner into the miner directory")]
    ExecutableNotFound(PathBuf),

    #[error("Failed to spawn miner: {0}")]
    Spawn(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StopError {
    #[error("Failed to signal miner process: {0}")]
    Signal(String),

    #[error("Failed to wait for miner process: {0}")]
    Wait(String),

    #[error("Failed to kill miner process: {0}")]
    Kill(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RestartError {
    #[error("No active session to restart")]
    NoActiveSession,

    #[error(transparent)]
    Stop(#[from] StopError),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

impl From<LaunchError> for RigError {
    fn from(e: LaunchError) -> Self {
        RigError::Launch(e.to_string())
    }
}

impl From<StopError> for RigError {
    fn from(e: StopError) -> Self {
        RigError::Process(e.to_string())
    }
}

impl From<RestartError> for RigError {
    fn from(e: RestartError) -> Self {
        match e {
            RestartError::NoActiveSession => RigError::NoActiveSession,
            RestartError::Stop(e) => e.into(),
            RestartError::Launch(e) => e.into(),
        }
    }
}

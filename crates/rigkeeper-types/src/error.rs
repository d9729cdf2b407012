use thiserror::Error;

#[derive(Error, Debug)]
pub enum RigError {
    #[error("Launch error: {0}")]
    Launch(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("No remembered session to relaunch")]
    NoActiveSession,

    #[error("Restart attempts exhausted after {attempts} attempts - manual intervention required")]
    RestartAttemptsExhausted { attempts: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid schedule window: {0}")]
    Schedule(String),

    #[error("Telemetry unavailable: {0}")]
    Telemetry(String),

    #[error("Notification delivery failed: {0}")]
    Notification(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RigResult<T> = Result<T, RigError>;

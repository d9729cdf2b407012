#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod session;
pub mod spawner;
pub mod stats;
pub mod supervisor;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{LaunchSpec, MinerBackend, DEFAULT_GMINER_PORT};
pub use error::{LaunchError, RestartError, StopError};
pub use session::{SessionConfig, WorkerSession};
pub use spawner::{OsSpawner, ProcessExit, ProcessHandle, ProcessSpawner};
pub use stats::{decode_stats, StatsClient, STATS_TIMEOUT};
pub use supervisor::{MinerSupervisor, StartOutcome, StatsEndpoint, SupervisorConfig, SwitchOutcome, DEFAULT_STOP_GRACE};

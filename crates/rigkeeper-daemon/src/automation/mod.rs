//! Automation layer: schedule gate, watchdog, restart policy and profit switching.

pub mod alerts;
mod arbiter;
mod policy;
mod schedule;
mod settings;
mod status;
mod watchdog;

pub use arbiter::{Arbiter, ArbiterDecision};
pub use policy::{backoff_delay, LowThroughputTracker, RestartDecision, RestartPolicy, LOW_HASHRATE_READINGS};
pub use schedule::{should_be_active, Clock, FixedClock, LocalClock, ScheduleGate, ScheduleWindow};
pub use settings::{AutomationSettings, SharedSettings};
pub use status::{AutomationStatus, HealthSnapshot, StatusBoard};
pub use watchdog::{TickFlow, Watchdog, WatchdogDeps};

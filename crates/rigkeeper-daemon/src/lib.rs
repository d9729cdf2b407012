#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod automation;
pub mod config;
pub mod services;

pub use adapters::{
    JsonStatusFile, LogNotifier, NoTelemetry, Notifier, NullSink, ProfitEstimate, ProfitTable, ProfitabilitySource,
    SnapshotFileTelemetry, StatusDocument, StatusSink, TelemetrySource,
};
pub use automation::{
    Arbiter, ArbiterDecision, AutomationSettings, AutomationStatus, HealthSnapshot, ScheduleGate, ScheduleWindow,
    SharedSettings, StatusBoard, Watchdog, WatchdogDeps,
};
pub use config::{DaemonConfig, LoggingConfig, LogLevel, PID_FILE_NAME, STATUS_FILE_NAME};
pub use services::{
    CancellationSource, CancellationToken, ServiceConfig, ServiceDeps, ServiceManager, ServiceState, ServiceType,
    StatsPoller,
};

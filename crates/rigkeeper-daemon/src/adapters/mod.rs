//! Default implementations of the collaborators the automation layer talks to.

mod notify;
mod profit;
mod status_file;
mod telemetry;

pub use notify::{render_alert, LogNotifier, Notifier};
pub use profit::{ProfitEstimate, ProfitTable, ProfitabilitySource};
pub use status_file::{JsonStatusFile, NullSink, StatusDocument, StatusSink};
pub use telemetry::{NoTelemetry, SnapshotFileTelemetry, TelemetrySource};

mod cancellation;
mod manager;
mod stats_poller;

pub use cancellation::{CancellationSource, CancellationToken};
pub use manager::{ServiceConfig, ServiceDeps, ServiceManager, ServiceState, ServiceType, SHUTDOWN_GRACE};
pub use stats_poller::StatsPoller;

#[cfg(test)]
mod tests;

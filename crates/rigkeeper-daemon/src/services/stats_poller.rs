use super::CancellationToken;
use crate::automation::SharedSettings;
use rigkeeper_miner::{MinerSupervisor, StatsClient};
use rigkeeper_types::RigResult;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Feeds the running miner's local stats API into the supervisor.
pub struct StatsPoller {
    supervisor: Arc<MinerSupervisor>,
    client: StatsClient,
    settings: Arc<SharedSettings>,
}

impl StatsPoller {
    pub fn new(supervisor: Arc<MinerSupervisor>, client: StatsClient, settings: Arc<SharedSettings>) -> Self {
        Self {
            supervisor,
            client,
            settings,
        }
    }

    pub async fn run(self, mut cancel: CancellationToken) -> RigResult<()> {
        info!("Stats poller running");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            self.poll_once().await;

            let interval = self.settings.load().stats_poll_interval();
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => break,
            }
        }

        info!("Stats poller shutting down");
        Ok(())
    }

    /// Returns `true` when fresh counters were stored.
    pub async fn poll_once(&self) -> bool {
        let Some(endpoint) = self.supervisor.stats_endpoint().await else {
            trace!("No running miner to poll");
            return false;
        };

        match self.client.fetch(endpoint.backend, &endpoint.url).await {
            Some(stats) => {
                debug!(
                    "{} stats: {:.2} MH/s, {} accepted, {} rejected",
                    endpoint.backend, stats.hashrate, stats.accepted, stats.rejected
                );
                self.supervisor.update_throughput(&endpoint.session_id, stats).await
            }
            None => false,
        }
    }
}

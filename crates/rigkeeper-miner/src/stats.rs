use crate::backend::MinerBackend;
use rigkeeper_types::MinerStats;
use serde::Deserialize;
use std::time::Duration;
use tracing::trace;

pub const STATS_TIMEOUT: Duration = Duration::from_secs(2);

const RAW_UNITS_PER_MH: f64 = 1_000_000.0;

#[derive(Deserialize)]
struct TRexSummary {
    #[serde(default)]
    hashrate: f64,
    #[serde(default)]
    accepted_count: u64,
    #[serde(default)]
    rejected_count: u64,
}

#[derive(Deserialize)]
struct LolMinerSummary {
    #[serde(rename = "GPUs", default)]
    gpus: Vec<LolMinerGpu>,
    #[serde(rename = "Session", default)]
    session: LolMinerSession,
}

#[derive(Deserialize)]
struct LolMinerGpu {
    #[serde(rename = "Performance", default)]
    performance: f64,
}

#[derive(Deserialize, Default)]
struct LolMinerSession {
    #[serde(rename = "Accepted", default)]
    accepted: u64,
    #[serde(rename = "Rejected", default)]
    rejected: u64,
}

#[derive(Deserialize)]
struct GMinerStat {
    #[serde(default)]
    devices: Vec<GMinerDevice>,
    #[serde(default)]
    total_accepted_shares: u64,
    #[serde(default)]
    total_rejected_shares: u64,
}

#[derive(Deserialize)]
struct GMinerDevice {
    #[serde(default)]
    speed: f64,
}

/// Decode a backend's stats body into MH/s and share counters.
pub fn decode_stats(backend: MinerBackend, body: &[u8]) -> Option<MinerStats> {
    match backend {
        MinerBackend::TRex => {
            let summary: TRexSummary = serde_json::from_slice(body).ok()?;
            Some(MinerStats {
                hashrate: summary.hashrate / RAW_UNITS_PER_MH,
                accepted: summary.accepted_count,
                rejected: summary.rejected_count,
            })
        }
        MinerBackend::LolMiner => {
            let summary: LolMinerSummary = serde_json::from_slice(body).ok()?;
            if summary.gpus.is_empty() {
                return None;
            }
            Some(MinerStats {
                hashrate: summary.gpus.iter().map(|gpu| gpu.performance).sum(),
                accepted: summary.session.accepted,
                rejected: summary.session.rejected,
            })
        }
        MinerBackend::GMiner => {
            let stat: GMinerStat = serde_json::from_slice(body).ok()?;
            Some(MinerStats {
                hashrate: stat.devices.iter().map(|d| d.speed).sum::<f64>() / RAW_UNITS_PER_MH,
                accepted: stat.total_accepted_shares,
                rejected: stat.total_rejected_shares,
            })
        }
    }
}

/// HTTP client for the miners' local statistics APIs.
#[derive(Clone)]
pub struct StatsClient {
    http: reqwest::Client,
}

impl StatsClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(STATS_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http }
    }

    /// Unreachable or undecodable endpoints yield `None`; callers keep the last-known values.
    pub async fn fetch(&self, backend: MinerBackend, url: &str) -> Option<MinerStats> {
        let response = match self.http.get(url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                trace!("{} stats endpoint returned {}", backend, r.status());
                return None;
            }
            Err(e) => {
                trace!("{} stats endpoint unreachable: {}", backend, e);
                return None;
            }
        };

        let body = response.bytes().await.ok()?;
        decode_stats(backend, &body)
    }
}

impl Default for StatsClient {
    fn default() -> Self {
        Self::new()
    }
}

use rigkeeper_miner::{MinerBackend, SessionConfig, DEFAULT_STOP_GRACE};
use rigkeeper_types::{RigError, RigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_STATS_POLL_INTERVAL_SECS: u64 = 10;

/// Per-coin launch parameters and the static numbers the profit table works from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinConfig {
    pub algorithm: String,
    pub pools: Vec<String>,
    pub backend: Option<MinerBackend>,
    pub wallet: Option<String>,
    /// MH/s
    pub expected_hashrate: f64,
    pub power_watts: f64,
    /// Coins earned per MH/s per day.
    pub revenue_per_unit: f64,
    /// Fiat price per coin. Coins without a price are left out of profit ranking.
    pub price: Option<f64>,
}

impl Default for CoinConfig {
    fn default() -> Self {
        Self {
            algorithm: String::new(),
            pools: Vec::new(),
            backend: None,
            wallet: None,
            expected_hashrate: 0.0,
            power_watts: 0.0,
            revenue_per_unit: 0.0,
            price: None,
        }
    }
}

impl CoinConfig {
    fn new(algorithm: &str, pool: &str, expected_hashrate: f64, power_watts: f64) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            pools: vec![pool.to_string()],
            expected_hashrate,
            power_watts,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    pub miner_dir: PathBuf,
    pub default_coin: String,
    pub wallet: String,
    pub worker_name: String,
    pub default_backend: MinerBackend,
    pub auto_start: bool,
    pub stop_grace_secs: u64,
    pub stats_poll_interval_secs: u64,
    pub coins: BTreeMap<String, CoinConfig>,
}

impl Default for MiningConfig {
    fn default() -> Self {
        let mut coins = BTreeMap::new();
        coins.insert("RVN".to_string(), CoinConfig::new("kawpow", "rvn.2miners.com:6060", 15.5, 90.0));
        coins.insert("ETC".to_string(), CoinConfig::new("etchash", "etc.2miners.com:1010", 28.0, 85.0));
        coins.insert("ERG".to_string(), CoinConfig::new("autolykos2", "erg.2miners.com:8888", 90.0, 95.0));

        Self {
            miner_dir: PathBuf::from("miners"),
            default_coin: "RVN".to_string(),
            wallet: String::new(),
            worker_name: default_worker_name(),
            default_backend: MinerBackend::TRex,
            auto_start: false,
            stop_grace_secs: DEFAULT_STOP_GRACE.as_secs(),
            stats_poll_interval_secs: DEFAULT_STATS_POLL_INTERVAL_SECS,
            coins,
        }
    }
}

fn default_worker_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "rig1".to_string())
}

impl MiningConfig {
    pub fn coin(&self, symbol: &str) -> Option<&CoinConfig> {
        self.coins.get(symbol)
    }

    /// Launch parameters for `symbol` from the coin table.
    pub fn session_for(&self, symbol: &str, worker_label: &str, backend: Option<MinerBackend>) -> RigResult<SessionConfig> {
        let coin = self
            .coin(symbol)
            .ok_or_else(|| RigError::Config(format!("Unknown coin: {}", symbol)))?;

        let pool = coin
            .pools
            .first()
            .ok_or_else(|| RigError::Config(format!("No pool configured for {}", symbol)))?;

        let credential = coin.wallet.clone().unwrap_or_else(|| self.wallet.clone());
        if credential.is_empty() {
            return Err(RigError::Config(format!("No wallet configured for {}", symbol)));
        }

        Ok(SessionConfig {
            target: symbol.to_string(),
            algorithm: coin.algorithm.clone(),
            pool: pool.clone(),
            credential,
            worker_label: worker_label.to_string(),
            backend: backend.or(coin.backend).unwrap_or(self.default_backend),
        })
    }

    pub fn default_session(&self) -> RigResult<SessionConfig> {
        self.session_for(&self.default_coin, &self.worker_name, None)
    }
}

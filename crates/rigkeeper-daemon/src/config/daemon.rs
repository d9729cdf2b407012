use rigkeeper_miner::SupervisorConfig;
use rigkeeper_types::{RigError, RigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::automation::AutomationConfig;
use super::logging::LoggingConfig;
use super::mining::MiningConfig;
use super::telemetry::TelemetryConfig;
use super::types::{ConfigWarning, LogLevel, WarningSeverity};
use crate::automation::ScheduleWindow;

pub const STATUS_FILE_NAME: &str = "status.json";
pub const PID_FILE_NAME: &str = "rigkeeper.pid";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub data_dir: PathBuf,
    pub mining: MiningConfig,
    pub automation: AutomationConfig,
    pub telemetry: TelemetryConfig,
    pub logging: LoggingConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            mining: MiningConfig::default(),
            automation: AutomationConfig::default(),
            telemetry: TelemetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".rigkeeper"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/rigkeeper"))
}

impl DaemonConfig {
    pub fn load(path: impl AsRef<Path>) -> RigResult<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| RigError::Config(format!("Failed to read config: {}", e)))?;

            toml::from_str(&contents)
                .map_err(|e| RigError::Config(format!("Failed to parse config: {}", e)))?
        } else {
            info!("Config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> RigResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RigError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RigError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path.as_ref(), contents)
            .map_err(|e| RigError::Config(format!("Failed to write config: {}", e)))?;

        info!("Configuration saved to {:?}", path.as_ref());
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("RIGKEEPER_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("RIGKEEPER_MINER_DIR") {
            self.mining.miner_dir = PathBuf::from(dir);
        }

        if let Ok(wallet) = std::env::var("RIGKEEPER_WALLET") {
            self.mining.wallet = wallet.trim().to_string();
        }

        if let Ok(level) = std::env::var("RIGKEEPER_LOG_LEVEL") {
            self.logging.level = level.parse().unwrap_or(LogLevel::Info);
        }

        if std::env::var("RIGKEEPER_LOG_JSON").is_ok() {
            self.logging.json = true;
        }
    }

    pub fn validate(&self) -> RigResult<()> {
        let automation = &self.automation;
        let restart = &automation.restart;

        if automation.check_interval_secs == 0 {
            return Err(RigError::Config("Watchdog check interval must be at least 1 second".into()));
        }

        if automation.profit_check_interval_mins == 0 {
            return Err(RigError::Config("Profit check interval must be at least 1 minute".into()));
        }

        if self.mining.stats_poll_interval_secs == 0 {
            return Err(RigError::Config("Stats poll interval must be at least 1 second".into()));
        }

        if restart.max_attempts == 0 {
            return Err(RigError::Config("restart.max_attempts must be at least 1".into()));
        }

        if restart.base_delay_secs == 0 || restart.base_delay_secs > restart.max_delay_secs {
            return Err(RigError::Config(format!(
                "restart.base_delay_secs ({}) must be between 1 and restart.max_delay_secs ({})",
                restart.base_delay_secs, restart.max_delay_secs
            )));
        }

        if restart.reset_window_secs == 0 {
            return Err(RigError::Config("restart.reset_window_secs must be at least 1".into()));
        }

        if !automation.hashrate_threshold.is_finite() || automation.hashrate_threshold < 0.0 {
            return Err(RigError::Config("Hashrate threshold cannot be negative".into()));
        }

        if automation.warning_temperature >= automation.critical_temperature {
            return Err(RigError::Config(format!(
                "Warning temperature ({}) must be below critical temperature ({})",
                automation.warning_temperature, automation.critical_temperature
            )));
        }

        if automation.electricity_cost < 0.0 || automation.min_switch_margin < 0.0 {
            return Err(RigError::Config(
                "Electricity cost and switch margin cannot be negative".into(),
            ));
        }

        for (symbol, coin) in &self.mining.coins {
            if coin.algorithm.trim().is_empty() {
                return Err(RigError::Config(format!("Coin {} has no algorithm", symbol)));
            }
        }

        if self.telemetry.max_age_secs == 0 {
            return Err(RigError::Config("telemetry.max_age_secs must be at least 1".into()));
        }

        Ok(())
    }

    pub fn check_warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if let Err(e) = ScheduleWindow::parse(&self.automation.mining_hours) {
            warnings.push(ConfigWarning {
                severity: if self.automation.scheduler_enabled {
                    WarningSeverity::High
                } else {
                    WarningSeverity::Medium
                },
                message: format!("{}. Mining will be treated as always active.", e),
                recommendation: "Use the form mining_hours = \"HH:MM-HH:MM\"".into(),
            });
        }

        if self.mining.wallet.is_empty() && self.mining.coins.values().any(|c| c.wallet.is_none()) {
            warnings.push(ConfigWarning {
                severity: WarningSeverity::High,
                message: "No wallet configured. Miners cannot be started.".into(),
                recommendation: "Set mining.wallet or RIGKEEPER_WALLET.".into(),
            });
        }

        if self.mining.coin(&self.mining.default_coin).is_none() {
            warnings.push(ConfigWarning {
                severity: WarningSeverity::High,
                message: format!("Default coin {} is not in the coin table.", self.mining.default_coin),
                recommendation: "Add it under [mining.coins] or change mining.default_coin.".into(),
            });
        }

        let executable = self.miner_dir().join(self.mining.default_backend.executable_name());
        if !executable.exists() {
            warnings.push(ConfigWarning {
                severity: WarningSeverity::Medium,
                message: format!("Miner executable not found at {:?}", executable),
                recommendation: "Download the miner into mining.miner_dir.".into(),
            });
        }

        if self.automation.auto_switch_enabled && self.mining.coins.values().all(|c| c.price.is_none()) {
            warnings.push(ConfigWarning {
                severity: WarningSeverity::Medium,
                message: "Auto-switch is enabled but no coin has a price.".into(),
                recommendation: "Set price for each coin in [mining.coins].".into(),
            });
        }

        if !self.automation.watchdog_enabled {
            warnings.push(ConfigWarning {
                severity: WarningSeverity::Low,
                message: "Watchdog is disabled. Crashes will not be recovered.".into(),
                recommendation: "Set automation.watchdog_enabled = true for unattended rigs.".into(),
            });
        }

        warnings
    }

    pub fn log_warnings(&self) {
        let warnings = self.check_warnings();
        if warnings.is_empty() {
            info!("Configuration check passed - no warnings");
            return;
        }

        for warning in &warnings {
            match warning.severity {
                WarningSeverity::High => {
                    warn!("CONFIG: {}", warning.message);
                    warn!("  -> {}", warning.recommendation);
                }
                WarningSeverity::Medium => {
                    warn!("{}", warning.message);
                    info!("  -> {}", warning.recommendation);
                }
                WarningSeverity::Low => {
                    info!("Note: {}", warning.message);
                }
            }
        }
    }

    /// Relative miner directories resolve against the data directory.
    pub fn miner_dir(&self) -> PathBuf {
        if self.mining.miner_dir.is_absolute() {
            self.mining.miner_dir.clone()
        } else {
            self.data_dir.join(&self.mining.miner_dir)
        }
    }

    pub fn status_path(&self) -> PathBuf {
        self.data_dir.join(STATUS_FILE_NAME)
    }

    pub fn pid_path(&self) -> PathBuf {
        self.data_dir.join(PID_FILE_NAME)
    }

    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            miner_dir: self.miner_dir(),
            stop_grace: Duration::from_secs(self.mining.stop_grace_secs),
        }
    }

    pub fn redacted(&self) -> RedactedConfig {
        RedactedConfig {
            data_dir: self.data_dir.clone(),
            miner_dir: self.miner_dir(),
            default_coin: self.mining.default_coin.clone(),
            default_backend: self.mining.default_backend.to_string(),
            wallet: mask_wallet(&self.mining.wallet),
            worker_name: self.mining.worker_name.clone(),
            coins: self.mining.coins.keys().cloned().collect(),
            features: vec![
                ("watchdog", self.automation.watchdog_enabled),
                ("scheduler", self.automation.scheduler_enabled),
                ("auto_switch", self.automation.auto_switch_enabled),
                ("emergency_stop", self.automation.emergency_stop_on_critical),
            ],
            mining_hours: self.automation.mining_hours.clone(),
            hashrate_threshold: self.automation.hashrate_threshold,
            thermal: (self.automation.warning_temperature, self.automation.critical_temperature),
        }
    }
}

fn mask_wallet(wallet: &str) -> String {
    let chars: Vec<char> = wallet.chars().collect();
    if chars.is_empty() {
        "(not set)".to_string()
    } else if chars.len() <= 10 {
        "****".to_string()
    } else {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

#[derive(Debug)]
pub struct RedactedConfig {
    pub data_dir: PathBuf,
    pub miner_dir: PathBuf,
    pub default_coin: String,
    pub default_backend: String,
    pub wallet: String,
    pub worker_name: String,
    pub coins: Vec<String>,
    pub features: Vec<(&'static str, bool)>,
    pub mining_hours: String,
    pub hashrate_threshold: f64,
    pub thermal: (f64, f64),
}

impl std::fmt::Display for RedactedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "rigkeeper Configuration")?;
        writeln!(f, "=======================")?;
        writeln!(f, "Data dir: {:?}", self.data_dir)?;
        writeln!(f, "Miner dir: {:?}", self.miner_dir)?;
        writeln!(f, "Default: {} via {}", self.default_coin, self.default_backend)?;
        writeln!(f, "Wallet: {}", self.wallet)?;
        writeln!(f, "Worker: {}", self.worker_name)?;
        writeln!(f, "Coins: {}", self.coins.join(", "))?;
        writeln!(f, "Automation:")?;
        for (name, enabled) in &self.features {
            writeln!(f, "  {}: {}", name, if *enabled { "ON" } else { "OFF" })?;
        }
        writeln!(f, "Mining hours: {}", self.mining_hours)?;
        writeln!(f, "Hashrate threshold: {:.2} MH/s", self.hashrate_threshold)?;
        writeln!(f, "Thermal: warn {:.0}C / critical {:.0}C", self.thermal.0, self.thermal.1)?;
        Ok(())
    }
}

use rigkeeper_types::{DEFAULT_CRITICAL_TEMPERATURE, DEFAULT_WARNING_TEMPERATURE};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_RESTART_ATTEMPTS: u32 = 5;
pub const DEFAULT_RESTART_BASE_DELAY_SECS: u64 = 60;
pub const DEFAULT_RESTART_MAX_DELAY_SECS: u64 = 600;
pub const DEFAULT_RESTART_RESET_WINDOW_SECS: u64 = 300;

pub const DEFAULT_HASHRATE_THRESHOLD: f64 = 20.0;
pub const DEFAULT_MINING_HOURS: &str = "00:00-23:59";
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_LOW_HASHRATE_GRACE_SECS: u64 = 90;
pub const DEFAULT_PROFIT_CHECK_INTERVAL_MINS: u64 = 60;
pub const DEFAULT_ELECTRICITY_COST: f64 = 0.12;
pub const DEFAULT_MIN_SWITCH_MARGIN: f64 = 0.10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartConfig {
    pub max_attempts: u32,
    pub base_delay_secs: u64,
    pub max_delay_secs: u64,
    pub reset_window_secs: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RESTART_ATTEMPTS,
            base_delay_secs: DEFAULT_RESTART_BASE_DELAY_SECS,
            max_delay_secs: DEFAULT_RESTART_MAX_DELAY_SECS,
            reset_window_secs: DEFAULT_RESTART_RESET_WINDOW_SECS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub watchdog_enabled: bool,
    pub scheduler_enabled: bool,
    pub auto_switch_enabled: bool,
    /// MH/s
    pub hashrate_threshold: f64,
    pub mining_hours: String,
    pub check_interval_secs: u64,
    pub low_hashrate_grace_secs: u64,
    pub warning_temperature: f64,
    pub critical_temperature: f64,
    pub emergency_stop_on_critical: bool,
    pub profit_check_interval_mins: u64,
    pub electricity_cost: f64,
    pub min_switch_margin: f64,
    pub restart: RestartConfig,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            watchdog_enabled: true,
            scheduler_enabled: false,
            auto_switch_enabled: false,
            hashrate_threshold: DEFAULT_HASHRATE_THRESHOLD,
            mining_hours: DEFAULT_MINING_HOURS.to_string(),
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            low_hashrate_grace_secs: DEFAULT_LOW_HASHRATE_GRACE_SECS,
            warning_temperature: DEFAULT_WARNING_TEMPERATURE,
            critical_temperature: DEFAULT_CRITICAL_TEMPERATURE,
            emergency_stop_on_critical: false,
            profit_check_interval_mins: DEFAULT_PROFIT_CHECK_INTERVAL_MINS,
            electricity_cost: DEFAULT_ELECTRICITY_COST,
            min_switch_margin: DEFAULT_MIN_SWITCH_MARGIN,
            restart: RestartConfig::default(),
        }
    }
}

mod automation;
mod daemon;
mod logging;
mod mining;
mod telemetry;
mod types;

pub use automation::*;
pub use daemon::{default_data_dir, DaemonConfig, RedactedConfig, PID_FILE_NAME, STATUS_FILE_NAME};
pub use logging::LoggingConfig;
pub use mining::{CoinConfig, MiningConfig, DEFAULT_STATS_POLL_INTERVAL_SECS};
pub use telemetry::{TelemetryConfig, DEFAULT_TELEMETRY_MAX_AGE_SECS};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use rigkeeper_miner::MinerBackend;

    #[test]
    fn test_default_config_validation() {
        let config = DaemonConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_restart_defaults() {
        let restart = RestartConfig::default();
        assert_eq!(restart.max_attempts, 5);
        assert_eq!(restart.base_delay_secs, 60);
        assert_eq!(restart.max_delay_secs, 600);
        assert_eq!(restart.reset_window_secs, 300);
    }

    #[test]
    fn test_zero_check_interval() {
        let mut config = DaemonConfig::default();
        config.automation.check_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_max_attempts() {
        let mut config = DaemonConfig::default();
        config.automation.restart.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_delay_above_max() {
        let mut config = DaemonConfig::default();
        config.automation.restart.base_delay_secs = 900;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_thermal_thresholds() {
        let mut config = DaemonConfig::default();
        config.automation.warning_temperature = 90.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_schedule_only_warns() {
        let mut config = DaemonConfig::default();
        config.automation.scheduler_enabled = true;
        config.automation.mining_hours = "late evening".into();

        assert!(config.validate().is_ok());
        let warnings = config.check_warnings();
        let schedule = warnings
            .iter()
            .find(|w| w.message.contains("always active"))
            .expect("schedule warning");
        assert_eq!(schedule.severity, WarningSeverity::High);
    }

    #[test]
    fn test_missing_wallet_and_unknown_coin_warn() {
        let mut config = DaemonConfig::default();
        config.mining.wallet.clear();
        config.mining.default_coin = "DOGE".into();

        let messages: Vec<String> = config.check_warnings().into_iter().map(|w| w.message).collect();
        assert!(messages.iter().any(|m| m.contains("No wallet")));
        assert!(messages.iter().any(|m| m.contains("DOGE")));
    }

    #[test]
    fn test_session_from_coin_table() {
        let mut config = DaemonConfig::default();
        config.mining.wallet = "RWalletAddress".into();

        let session = config
            .mining
            .session_for("RVN", "rig7", None)
            .expect("session");
        assert_eq!(session.algorithm, "kawpow");
        assert_eq!(session.pool, "rvn.2miners.com:6060");
        assert_eq!(session.credential, "RWalletAddress");
        assert_eq!(session.worker_label, "rig7");
        assert_eq!(session.backend, MinerBackend::TRex);

        let session = config
            .mining
            .session_for("ERG", "rig7", Some(MinerBackend::LolMiner))
            .expect("session");
        assert_eq!(session.backend, MinerBackend::LolMiner);

        assert!(config.mining.session_for("DOGE", "rig7", None).is_err());
    }

    #[test]
    fn test_session_requires_wallet() {
        let mut config = DaemonConfig::default();
        config.mining.wallet.clear();
        assert!(config.mining.default_session().is_err());

        config
            .mining
            .coins
            .get_mut("RVN")
            .expect("RVN")
            .wallet = Some("per-coin".into());
        assert_eq!(config.mining.default_session().expect("session").credential, "per-coin");
    }

    #[test]
    fn test_relative_miner_dir_resolves_under_data_dir() {
        let mut config = DaemonConfig::default();
        config.data_dir = "/srv/rig".into();
        config.mining.miner_dir = "miners".into();
        assert_eq!(config.miner_dir(), std::path::PathBuf::from("/srv/rig/miners"));

        config.mining.miner_dir = "/opt/t-rex".into();
        assert_eq!(config.supervisor_config().miner_dir, std::path::PathBuf::from("/opt/t-rex"));
    }

    #[test]
    fn test_redacted_config_masks_wallet() {
        let mut config = DaemonConfig::default();
        config.mining.wallet = "RVNabcdefghijklmnopqrstuvwxyz".into();
        let rendered = config.redacted().to_string();
        assert!(rendered.contains("RVNabc...wxyz"));
        assert!(!rendered.contains("RVNabcdefghijklmnopqrstuvwxyz"));
    }

    #[test]
    fn test_config_serialization() {
        let mut config = DaemonConfig::default();
        config.mining.coins.get_mut("ETC").expect("ETC").price = Some(18.5);
        config.automation.emergency_stop_on_critical = true;

        let toml_str = toml::to_string_pretty(&config).expect("Failed to serialize");
        let parsed: DaemonConfig = toml::from_str(&toml_str).expect("Failed to parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: DaemonConfig = toml::from_str(
            r#"
            [automation]
            hashrate_threshold = 12.5

            [automation.restart]
            max_attempts = 3
            "#,
        )
        .expect("parse");

        assert_eq!(parsed.automation.hashrate_threshold, 12.5);
        assert_eq!(parsed.automation.restart.max_attempts, 3);
        assert_eq!(parsed.automation.restart.base_delay_secs, 60);
        assert_eq!(parsed.automation.check_interval_secs, 30);
        assert!(parsed.mining.coins.contains_key("RVN"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut config = DaemonConfig::default();
        config.automation.mining_hours = "22:00-06:00".into();
        config.save(&path).expect("save");

        let loaded = DaemonConfig::load(&path).expect("load");
        assert_eq!(loaded.automation.mining_hours, "22:00-06:00");
    }
}

use super::commands::{ConfigAction, OutputFormat};
use super::utils::{load_config, ACCENT, DIM, FAIL, OK, RESET, WARN};
use rigkeeper_daemon::config::WarningSeverity;
use rigkeeper_types::{RigError, RigResult};
use std::path::{Path, PathBuf};

pub fn handle_config(
    config_path: &Path,
    data_dir: Option<&PathBuf>,
    action: Option<ConfigAction>,
    format: OutputFormat,
) -> RigResult<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            if !config_path.exists() {
                println!("{}No configuration file found at {:?}; showing defaults{}", DIM, config_path, RESET);
                println!("Run '{}rigkeeper init{}' to create one", ACCENT, RESET);
                println!();
            }

            let config = load_config(config_path, data_dir)?;
            match format {
                OutputFormat::Text => print!("{}", config.redacted()),
                OutputFormat::Json => {
                    let mut shown = config.clone();
                    shown.mining.wallet = config.redacted().wallet;
                    for coin in shown.mining.coins.values_mut() {
                        if coin.wallet.is_some() {
                            coin.wallet = Some("****".into());
                        }
                    }
                    let json =
                        serde_json::to_string_pretty(&shown).map_err(|e| RigError::Serialization(e.to_string()))?;
                    println!("{}", json);
                }
            }
        }
        Some(ConfigAction::Validate) => {
            if !config_path.exists() {
                println!("{}No configuration file found at {:?}{}", DIM, config_path, RESET);
                return Ok(());
            }

            match load_config(config_path, data_dir) {
                Ok(config) => {
                    println!("{}[+]{} Configuration is valid", OK, RESET);
                    for warning in config.check_warnings() {
                        let color = match warning.severity {
                            WarningSeverity::High => FAIL,
                            WarningSeverity::Medium => WARN,
                            WarningSeverity::Low => DIM,
                        };
                        println!("{}[!]{} {}", color, RESET, warning.message);
                        println!("    {}{}{}", DIM, warning.recommendation, RESET);
                    }
                }
                Err(e) => println!("{}[-]{} Configuration error: {}", FAIL, RESET, e),
            }
        }
    }
    Ok(())
}

use super::utils::{ACCENT, OK, RESET, WARN};
use rigkeeper_daemon::DaemonConfig;
use rigkeeper_types::{RigError, RigResult};
use std::path::{Path, PathBuf};

pub fn init_config(config_path: &Path, data_dir: Option<&PathBuf>, force: bool) -> RigResult<()> {
    println!("{}Initializing rigkeeper...{}", OK, RESET);
    println!();

    if config_path.exists() && !force {
        println!("{}Configuration already exists at {:?}{}", WARN, config_path, RESET);
        println!("Use --force to overwrite");
        return Ok(());
    }

    let mut config = DaemonConfig::default();
    if let Some(dir) = data_dir {
        config.data_dir = dir.clone();
    }

    std::fs::create_dir_all(&config.data_dir)
        .map_err(|e| RigError::Config(format!("Failed to create data directory: {}", e)))?;
    std::fs::create_dir_all(config.miner_dir())
        .map_err(|e| RigError::Config(format!("Failed to create miner directory: {}", e)))?;

    config.save(config_path)?;

    println!("{}[+]{} Configuration written to {:?}", OK, RESET, config_path);
    println!("{}[+]{} Miner directory: {:?}", OK, RESET, config.miner_dir());
    println!();
    println!("Next steps:");
    println!("  1. Set {}mining.wallet{} in the config (or RIGKEEPER_WALLET)", ACCENT, RESET);
    println!(
        "  2. Put the {} binary into the miner directory",
        config.mining.default_backend.executable_name()
    );
    println!("  3. Run {}rigkeeper check{}, then {}rigkeeper run{}", ACCENT, RESET, ACCENT, RESET);
    Ok(())
}

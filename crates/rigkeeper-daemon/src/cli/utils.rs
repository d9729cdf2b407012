use super::commands::Cli;
use rigkeeper_daemon::{DaemonConfig, LoggingConfig};
use rigkeeper_types::{RigError, RigResult};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const OK: &str = "\x1b[38;5;46m";
pub const WARN: &str = "\x1b[38;5;226m";
pub const FAIL: &str = "\x1b[38;5;196m";
pub const DIM: &str = "\x1b[38;5;245m";
pub const ACCENT: &str = "\x1b[38;5;51m";
pub const RESET: &str = "\x1b[0m";

/// `RUST_LOG` wins; otherwise `-q`/`-v`, then the configured level.
pub fn init_logging(cli: &Cli, logging: &LoggingConfig) {
    let level = if cli.quiet {
        "warn".to_string()
    } else {
        match cli.verbose {
            0 => logging.level.to_string(),
            1 => "info,rigkeeper_daemon=debug,rigkeeper_miner=debug".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let plain = (!logging.json).then(|| fmt::layer().with_target(cli.verbose >= 2));
    let json = logging.json.then(|| fmt::layer().json());

    let log_file = cli.log_file.as_ref().or(logging.file.as_ref());
    let file_layer = log_file.and_then(|path| {
        match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            ),
            Err(e) => {
                eprintln!("Cannot open log file {}: {}", path.display(), e);
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(plain)
        .with(json)
        .with(file_layer)
        .init();
}

/// Load the config file and let `--data-dir` override what it says.
pub fn load_config(config_path: &Path, data_dir: Option<&PathBuf>) -> RigResult<DaemonConfig> {
    let mut config = DaemonConfig::load(config_path)?;
    if let Some(dir) = data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

pub fn read_pid(pid_file: &Path) -> RigResult<Option<i32>> {
    if !pid_file.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(pid_file)
        .map_err(|e| RigError::Io(format!("Failed to read PID file: {}", e)))?;
    let pid = contents
        .trim()
        .parse()
        .map_err(|e| RigError::Internal(format!("Invalid PID in {}: {}", pid_file.display(), e)))?;
    Ok(Some(pid))
}

pub fn print_banner() {
    println!("{}rigkeeper{} {}v{}{}", OK, RESET, DIM, BUILD_VERSION, RESET);
    println!("{}Unattended miner supervision{}", DIM, RESET);
    println!();
}

pub fn rule() -> String {
    format!("{}{}{}", DIM, "═".repeat(50), RESET)
}

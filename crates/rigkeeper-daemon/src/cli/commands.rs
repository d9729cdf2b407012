use clap::{Parser, Subcommand, ValueEnum};
use rigkeeper_miner::MinerBackend;
use std::path::PathBuf;

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "rigkeeper")]
#[command(version = BUILD_VERSION)]
#[command(about = "rigkeeper - Unattended miner supervision, watchdog and profit switching")]
#[command(long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(short, long, global = true, value_name = "FILE", help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(short = 'd', long, global = true, value_name = "DIR", env = "RIGKEEPER_DATA_DIR", help = "Data directory path")]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase verbosity (-v, -vv, -vvv)")]
    pub verbose: u8,

    #[arg(short, long, global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[arg(long, global = true, value_name = "FILE", help = "Write logs to file")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text", help = "Output format")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the daemon")]
    #[command(long_about = "Start the rigkeeper daemon.\n\nSupervises the miner process, runs the watchdog, the profit arbiter and the stats poller until SIGTERM or Ctrl+C.")]
    Run {
        #[arg(long, value_name = "FILE", help = "Write PID to file (default: <data-dir>/rigkeeper.pid)")]
        pid_file: Option<PathBuf>,
        #[arg(long, help = "Notify systemd when ready")]
        systemd: bool,
    },

    #[command(about = "Write a default configuration")]
    Init {
        #[arg(short, long, help = "Overwrite existing configuration")]
        force: bool,
    },

    #[command(about = "Show miner and automation status")]
    Status,

    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    #[command(about = "Run health checks")]
    Check,

    #[command(about = "Print the miner command line for a coin")]
    LaunchSpec {
        #[arg(long, help = "Coin symbol from the coins table")]
        coin: String,
        #[arg(long, help = "Override the backend (t-rex, lolminer, gminer)")]
        backend: Option<MinerBackend>,
    },

    #[command(about = "Stop the daemon")]
    Stop {
        #[arg(short, long, help = "Force stop (SIGKILL)")]
        force: bool,
    },

    #[command(about = "Reload configuration")]
    Reload,

    #[command(about = "Clear a fatal watchdog condition and relaunch the miner")]
    Recover,

    #[command(about = "Show version information")]
    Version,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Validate configuration")]
    Validate,
}

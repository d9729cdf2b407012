mod cli;

use clap::Parser;
use cli::{
    handle_config, init_config, init_logging, load_config, recover_daemon, reload_daemon, run_checks, run_daemon,
    show_launch_spec, show_status, show_version, stop_daemon, Cli, Commands,
};
use rigkeeper_daemon::config::default_data_dir;
use rigkeeper_daemon::{LoggingConfig, PID_FILE_NAME};
use rigkeeper_types::RigResult;

#[tokio::main]
async fn main() -> RigResult<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let config_path = cli.config.clone().unwrap_or_else(|| data_dir.join("config.toml"));

    let loaded = load_config(&config_path, cli.data_dir.as_ref());
    let default_logging = LoggingConfig::default();
    init_logging(&cli, loaded.as_ref().map(|c| &c.logging).unwrap_or(&default_logging));

    let pid_path = loaded
        .as_ref()
        .map(|c| c.pid_path())
        .unwrap_or_else(|_| data_dir.join(PID_FILE_NAME));

    match cli.command {
        Commands::Run { pid_file, systemd } => {
            run_daemon(loaded?, &config_path, cli.data_dir.as_ref(), pid_file, systemd).await?;
        }
        Commands::Init { force } => {
            init_config(&config_path, cli.data_dir.as_ref(), force)?;
        }
        Commands::Status => {
            show_status(&loaded?, cli.format)?;
        }
        Commands::Config { action } => {
            handle_config(&config_path, cli.data_dir.as_ref(), action, cli.format)?;
        }
        Commands::Check => {
            run_checks(&config_path, cli.data_dir.as_ref()).await?;
        }
        Commands::LaunchSpec { coin, backend } => {
            show_launch_spec(&loaded?, &coin, backend, cli.format)?;
        }
        Commands::Stop { force } => {
            stop_daemon(&pid_path, force)?;
        }
        Commands::Reload => {
            reload_daemon(&pid_path)?;
        }
        Commands::Recover => {
            recover_daemon(&pid_path)?;
        }
        Commands::Version => {
            show_version();
        }
    }

    Ok(())
}

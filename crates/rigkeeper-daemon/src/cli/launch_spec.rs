use super::commands::OutputFormat;
use rigkeeper_daemon::DaemonConfig;
use rigkeeper_miner::MinerBackend;
use rigkeeper_types::{RigError, RigResult};

/// Print what `run` would spawn for `coin`, without spawning it.
pub fn show_launch_spec(
    config: &DaemonConfig,
    coin: &str,
    backend: Option<MinerBackend>,
    format: OutputFormat,
) -> RigResult<()> {
    let session = config
        .mining
        .session_for(coin, &config.mining.worker_name, backend)?;
    let spec = session.backend.launch_spec(&config.miner_dir(), &session);

    match format {
        OutputFormat::Text => {
            println!("{}", spec.command_line());
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "coin": session.target,
                "backend": spec.backend,
                "program": spec.program,
                "args": spec.args,
                "working_dir": spec.working_dir,
                "stats_url": spec.backend.stats_url(),
            });
            let rendered =
                serde_json::to_string_pretty(&json).map_err(|e| RigError::Serialization(e.to_string()))?;
            println!("{}", rendered);
        }
    }

    Ok(())
}

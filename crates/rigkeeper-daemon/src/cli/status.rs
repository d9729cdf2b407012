use super::commands::OutputFormat;
use super::utils::{read_pid, rule, ACCENT, DIM, FAIL, OK, RESET, WARN};
use rigkeeper_daemon::automation::alerts::format_duration;
use rigkeeper_daemon::{DaemonConfig, StatusDocument};
use rigkeeper_types::{ProcessState, RigError, RigResult, HASHRATE_UNIT};

pub fn show_status(config: &DaemonConfig, format: OutputFormat) -> RigResult<()> {
    let status_path = config.status_path();
    let pid = read_pid(&config.pid_path()).ok().flatten();

    if !status_path.exists() {
        match format {
            OutputFormat::Json => println!("{{\"running\": false}}"),
            OutputFormat::Text => {
                println!("{}* rigkeeper: NOT RUNNING{}", DIM, RESET);
                println!();
                println!("Start with: {}rigkeeper run{}", ACCENT, RESET);
            }
        }
        return Ok(());
    }

    let document = StatusDocument::load(&status_path)?;
    let age = chrono::Utc::now().signed_duration_since(document.updated_at);
    let stale_after = config.automation.check_interval_secs.saturating_mul(3) as i64;
    let stale = age.num_seconds() > stale_after;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&document).map_err(|e| RigError::Serialization(e.to_string()))?;
            println!("{}", json);
        }
        OutputFormat::Text => print_text(&document, pid, stale, age.num_seconds()),
    }

    Ok(())
}

fn print_text(document: &StatusDocument, pid: Option<i32>, stale: bool, age_secs: i64) {
    let miner = &document.miner;
    let automation = &document.automation;

    if stale {
        println!(
            "{}* rigkeeper: STALE{} (last update {}s ago, daemon may have stopped)",
            FAIL, RESET, age_secs
        );
    } else {
        match pid {
            Some(pid) => println!("{}* rigkeeper: RUNNING{} (pid {})", OK, RESET, pid),
            None => println!("{}* rigkeeper: RUNNING{}", OK, RESET),
        }
    }
    println!("{}", rule());

    let state_color = match miner.state {
        ProcessState::Running => OK,
        ProcessState::Starting | ProcessState::Stopped => DIM,
        ProcessState::Crashed | ProcessState::Error => FAIL,
    };
    println!("Miner:           {}{}{}", state_color, miner.state, RESET);
    if let Some(target) = &miner.target {
        println!("Coin:            {}{}{}", ACCENT, target, RESET);
    }
    if let Some(pool) = &miner.pool {
        println!("Pool:            {}", pool);
    }
    if miner.state == ProcessState::Running {
        println!("Uptime:          {}", format_duration(miner.uptime_secs));
        println!("Hashrate:        {}{:.2} {}{}", ACCENT, miner.hashrate, HASHRATE_UNIT, RESET);
        println!("Shares:          {} accepted / {} rejected", miner.accepted, miner.rejected);
    }

    println!("{}", rule());
    println!(
        "Schedule:        {}",
        if automation.schedule_active { "inside mining hours" } else { "outside mining hours" }
    );
    println!("Restarts:        {}", automation.restart_attempts);
    if let Some(at) = automation.last_restart_at {
        println!("Last restart:    {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if automation.consecutive_low_readings > 0 {
        println!(
            "Low hashrate:    {}{} consecutive reading(s){}",
            WARN, automation.consecutive_low_readings, RESET
        );
    }
    if let Some(reason) = &automation.fatal_reason {
        println!("{}FATAL:           {}{}", FAIL, reason, RESET);
        println!("Run '{}rigkeeper recover{}' once the cause is fixed", ACCENT, RESET);
    }

    if let Some(health) = &document.health {
        for device in &health.devices {
            println!("GPU {}:           {:.1}C", device.id, device.temperature);
        }
    }
    println!("{}", rule());
}

use super::utils::{load_config, rule, FAIL, OK, RESET, WARN};
use rigkeeper_daemon::{DaemonConfig, ScheduleWindow, SnapshotFileTelemetry, TelemetrySource};
use rigkeeper_types::RigResult;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Default)]
struct Tally {
    passed: u32,
    warnings: u32,
    failed: u32,
}

impl Tally {
    fn ok(&mut self, detail: &str) {
        if detail.is_empty() {
            println!("{}OK{}", OK, RESET);
        } else {
            println!("{}OK{} ({})", OK, RESET, detail);
        }
        self.passed += 1;
    }

    fn warn(&mut self, detail: &str) {
        println!("{}WARN{} - {}", WARN, RESET, detail);
        self.warnings += 1;
    }

    fn fail(&mut self, detail: &str) {
        println!("{}FAIL{} - {}", FAIL, RESET, detail);
        self.failed += 1;
    }
}

fn label(text: &str) {
    print!("{:<27}", text);
    let _ = std::io::stdout().flush();
}

pub async fn run_checks(config_path: &Path, data_dir: Option<&PathBuf>) -> RigResult<()> {
    println!("{}rigkeeper Diagnostics{}", OK, RESET);
    println!("{}", rule());
    println!();

    let mut tally = Tally::default();

    label("[1/7] Configuration:");
    let config = match load_config(config_path, data_dir) {
        Ok(config) if config_path.exists() => {
            tally.ok("");
            config
        }
        Ok(config) => {
            tally.warn("No config file, using defaults");
            config
        }
        Err(e) => {
            tally.fail(&e.to_string());
            let mut config = DaemonConfig::default();
            if let Some(dir) = data_dir {
                config.data_dir = dir.clone();
            }
            config
        }
    };

    label("[2/7] Data Directory:");
    let dir = &config.data_dir;
    if dir.is_dir() {
        tally.ok("");
    } else if dir.exists() {
        tally.fail("Not a directory");
    } else {
        tally.warn("Will be created on start");
    }

    label("[3/7] Wallet:");
    match config.mining.default_session() {
        Ok(session) => tally.ok(&format!("{} via {}", session.target, session.backend)),
        Err(e) => tally.fail(&e.to_string()),
    }

    label("[4/7] Miner Executable:");
    let backend = config
        .mining
        .coin(&config.mining.default_coin)
        .and_then(|c| c.backend)
        .unwrap_or(config.mining.default_backend);
    let executable = config.miner_dir().join(backend.executable_name());
    if executable.is_file() {
        tally.ok(&executable.display().to_string());
    } else {
        tally.fail(&format!("{} not found", executable.display()));
    }

    label("[5/7] Mining Hours:");
    match ScheduleWindow::parse(&config.automation.mining_hours) {
        Ok(window) if config.automation.scheduler_enabled => tally.ok(&window.to_string()),
        Ok(_) => tally.ok("scheduler disabled"),
        Err(e) => tally.warn(&format!("{}; treated as always active", e)),
    }

    label("[6/7] GPU Telemetry:");
    match &config.telemetry.snapshot_path {
        Some(path) => {
            let source = SnapshotFileTelemetry::new(path.clone(), Duration::from_secs(config.telemetry.max_age_secs));
            match source.latest_snapshot().await {
                Some(snapshot) => tally.ok(&format!("{} device(s)", snapshot.devices.len())),
                None => tally.warn(&format!("{} missing or stale", path.display())),
            }
        }
        None => tally.warn("No snapshot_path; thermal checks disabled"),
    }

    label(&format!("[7/7] Stats Port ({}):", backend.api_port()));
    match std::net::TcpListener::bind(("127.0.0.1", backend.api_port())) {
        Ok(_) => tally.ok("available"),
        Err(_) => tally.warn("In use (miner may be running)"),
    }

    println!();
    println!("{}", rule());
    println!(
        "Results: {}{} passed{}, {}{} warnings{}, {}{} failed{}",
        OK, tally.passed, RESET, WARN, tally.warnings, RESET, FAIL, tally.failed, RESET
    );

    if tally.failed > 0 {
        println!("\n{}Some checks failed. Fix issues before running.{}", FAIL, RESET);
    } else if tally.warnings > 0 {
        println!("\n{}All critical checks passed. Some warnings may need attention.{}", WARN, RESET);
    } else {
        println!("\n{}All checks passed! Ready to run.{}", OK, RESET);
    }

    Ok(())
}

use rigkeeper_types::{Alert, AlertKind, AlertSeverity, HASHRATE_UNIT};

pub fn mining_started(coin: &str, pool: &str) -> Alert {
    Alert::new(AlertKind::MiningStarted, AlertSeverity::Success)
        .field("coin", coin)
        .field("pool", pool)
}

pub fn mining_stopped(coin: &str, uptime_secs: u64, reason: &str) -> Alert {
    Alert::new(AlertKind::MiningStopped, AlertSeverity::Info)
        .field("coin", coin)
        .field("duration", format_duration(uptime_secs))
        .field("reason", reason)
}

pub fn miner_crashed(coin: &str, action: &str) -> Alert {
    Alert::new(AlertKind::MinerCrashed, AlertSeverity::Error)
        .field("coin", coin)
        .field("action", action)
}

pub fn low_hashrate(coin: &str, current: f64, expected: f64) -> Alert {
    let mut alert = Alert::new(AlertKind::LowHashrate, AlertSeverity::Warning)
        .field("coin", coin)
        .field("current", format!("{:.2} {}", current, HASHRATE_UNIT))
        .field("expected", format!("{:.2} {}", expected, HASHRATE_UNIT));
    if expected > 0.0 {
        alert = alert.field("difference", format!("{:.1}%", (current / expected - 1.0) * 100.0));
    }
    alert
}

pub fn high_temperature(device: u32, temperature: f64, severity: AlertSeverity) -> Alert {
    Alert::new(AlertKind::HighTemperature, severity)
        .field("device", device)
        .field("temperature", format!("{:.1}C", temperature))
        .field("action", "check cooling")
}

pub fn format_duration(secs: u64) -> String {
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}

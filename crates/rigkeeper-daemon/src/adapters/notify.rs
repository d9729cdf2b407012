use async_trait::async_trait;
use rigkeeper_types::{Alert, AlertSeverity, RigResult};
use tracing::{error, info, warn};

/// Fire-and-forget alert delivery. Failures are logged by the caller and never retried.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn alert(&self, alert: Alert) -> RigResult<()>;
}

/// Renders alerts into the daemon log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

pub fn render_alert(alert: &Alert) -> String {
    let mut line = alert.kind.to_string();
    for (key, value) in &alert.fields {
        line.push_str(&format!(" {}={}", key, value));
    }
    line
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn alert(&self, alert: Alert) -> RigResult<()> {
        let message = render_alert(&alert);
        match alert.severity {
            AlertSeverity::Info | AlertSeverity::Success => {
                info!(kind = %alert.kind, severity = %alert.severity, "ALERT {}", message)
            }
            AlertSeverity::Warning => warn!(kind = %alert.kind, severity = %alert.severity, "ALERT {}", message),
            AlertSeverity::Error | AlertSeverity::Critical => {
                error!(kind = %alert.kind, severity = %alert.severity, "ALERT {}", message)
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigkeeper_types::AlertKind;

    #[test]
    fn test_render_alert() {
        let alert = Alert::new(AlertKind::MiningStarted, AlertSeverity::Success)
            .field("coin", "RVN")
            .field("pool", "rvn.pool:6060");
        assert_eq!(render_alert(&alert), "mining_started coin=RVN pool=rvn.pool:6060");
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let alert = Alert::new(AlertKind::HighTemperature, AlertSeverity::Critical).field("device", 0);
        assert!(LogNotifier.alert(alert).await.is_ok());
    }
}

//! Severity-gated alert dispatch.

use crate::detect::{Anomaly, Severity};
use tracing::{info, warn};
use uuid::Uuid;

/// Outbound notification channel. Delivery is best-effort; failures are the
/// channel's problem, not the detection run's.
pub trait Notifier: Send + Sync {
    fn notify(&self, dispatch_id: Uuid, anomaly: &Anomaly);
}

/// Stub channel: logs each alert until a real email/SMS integration lands.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, dispatch_id: Uuid, anomaly: &Anomaly) {
        warn!(
            %dispatch_id,
            severity = anomaly.severity.label(),
            subject = %anomaly.subject,
            "{}",
            anomaly.description
        );
    }
}

/// Forward critical and major anomalies to the notification channel.
/// Returns the number dispatched.
pub fn dispatch(anomalies: &[Anomaly], notifier: &dyn Notifier) -> usize {
    let urgent: Vec<&Anomaly> = anomalies
        .iter()
        .filter(|a| a.severity >= Severity::Major)
        .collect();

    if urgent.is_empty() {
        info!("no critical or major anomalies to alert");
        return 0;
    }

    for anomaly in &urgent {
        notifier.notify(Uuid::new_v4(), anomaly);
    }
    urgent.len()
}

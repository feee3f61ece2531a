use crate::detect::engine::{DetectionWindow, Detector};
use crate::detect::scoring::{classify, safe_rate};
use crate::detect::thresholds::ThresholdSet;
use crate::detect::{Anomaly, Dimension};
use crate::metrics::{MetricRecord, MetricSource};
use anyhow::Result;
use std::sync::Arc;

/// Flags supplier-days where the cheat rate exceeds its ceiling.
pub struct CheatRateDetector {
    source: Arc<dyn MetricSource>,
}

impl CheatRateDetector {
    pub fn new(source: Arc<dyn MetricSource>) -> Self {
        Self { source }
    }
}

/// Evaluate one supplier-day. Days with no learners are skipped.
pub fn evaluate(record: &MetricRecord, threshold: f64) -> Option<Anomaly> {
    let rate = safe_rate(record.cheat_count as f64, record.learn_count as f64)?;
    if rate <= threshold {
        return None;
    }
    Some(Anomaly {
        dimension: Dimension::CheatRate,
        severity: classify(rate, threshold),
        subject: record.supplier.clone(),
        date: record.date,
        value: rate,
        threshold,
        description: format!("作弊率异常: {:.2}% (阈值: {}%)", rate, threshold),
        details: serde_json::json!({
            "supplier": record.supplier,
            "date": record.date,
            "daily_learn_count": record.learn_count,
            "daily_cheat_count": record.cheat_count,
        }),
    })
}

#[async_trait::async_trait]
impl Detector for CheatRateDetector {
    fn dimension(&self) -> Dimension {
        Dimension::CheatRate
    }

    async fn detect(
        &self,
        window: &DetectionWindow,
        thresholds: &ThresholdSet,
    ) -> Result<Vec<Anomaly>> {
        let records = self.source.metrics_in_range(window.start, window.end).await?;
        Ok(records
            .iter()
            .filter_map(|r| evaluate(r, thresholds.cheat_rate))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Severity;
    use chrono::NaiveDate;

    fn record(login: u64, learn: u64, cheat: u64) -> MetricRecord {
        MetricRecord {
            supplier: "华信培训".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 7, 15).unwrap(),
            login_count: login,
            learn_count: learn,
            cheat_count: cheat,
            face_success_count: 0,
            face_fail_count: 0,
        }
    }

    #[test]
    fn zero_learners_never_flags() {
        assert!(evaluate(&record(50, 0, 0), 5.0).is_none());
        assert!(evaluate(&record(50, 0, 10), 5.0).is_none());
    }

    #[test]
    fn rate_at_threshold_is_not_a_violation() {
        // 5 of 100 = exactly 5.0%
        assert!(evaluate(&record(100, 100, 5), 5.0).is_none());
    }

    #[test]
    fn double_the_ceiling_is_major() {
        let anomaly = evaluate(&record(100, 100, 10), 5.0).expect("should flag");
        assert_eq!(anomaly.value, 10.0);
        assert_eq!(anomaly.severity, Severity::Major);
        assert_eq!(anomaly.subject, "华信培训");
        assert_eq!(anomaly.details["daily_cheat_count"], 10);
    }
}

use crate::detect::engine::{DetectionWindow, Detector};
use crate::detect::scoring::{classify, safe_rate};
use crate::detect::thresholds::ThresholdSet;
use crate::detect::{Anomaly, Dimension};
use crate::metrics::{MetricRecord, MetricSource};
use anyhow::Result;
use std::sync::Arc;

/// Flags supplier-days where face-recognition failures exceed their ceiling.
pub struct FaceFailDetector {
    source: Arc<dyn MetricSource>,
}

impl FaceFailDetector {
    pub fn new(source: Arc<dyn MetricSource>) -> Self {
        Self { source }
    }
}

/// Evaluate one supplier-day. Days with no recognition attempts are skipped.
pub fn evaluate(record: &MetricRecord, threshold: f64) -> Option<Anomaly> {
    let total = record.face_success_count + record.face_fail_count;
    let rate = safe_rate(record.face_fail_count as f64, total as f64)?;
    if rate <= threshold {
        return None;
    }
    Some(Anomaly {
        dimension: Dimension::FaceFail,
        severity: classify(rate, threshold),
        subject: record.supplier.clone(),
        date: record.date,
        value: rate,
        threshold,
        description: format!("人脸识别失败率异常: {:.2}% (阈值: {}%)", rate, threshold),
        details: serde_json::json!({
            "supplier": record.supplier,
            "date": record.date,
            "face_success_count": record.face_success_count,
            "face_fail_count": record.face_fail_count,
            "total_attempts": total,
        }),
    })
}

#[async_trait::async_trait]
impl Detector for FaceFailDetector {
    fn dimension(&self) -> Dimension {
        Dimension::FaceFail
    }

    async fn detect(
        &self,
        window: &DetectionWindow,
        thresholds: &ThresholdSet,
    ) -> Result<Vec<Anomaly>> {
        let records = self.source.metrics_in_range(window.start, window.end).await?;
        Ok(records
            .iter()
            .filter_map(|r| evaluate(r, thresholds.face_fail_rate))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Severity;
    use chrono::NaiveDate;

    fn record(success: u64, fail: u64) -> MetricRecord {
        MetricRecord {
            supplier: "远航教育".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 7, 15).unwrap(),
            login_count: 0,
            learn_count: 0,
            cheat_count: 0,
            face_success_count: success,
            face_fail_count: fail,
        }
    }

    #[test]
    fn zero_attempts_never_flags() {
        assert!(evaluate(&record(0, 0), 20.0).is_none());
    }

    #[test]
    fn failure_rate_above_ceiling_flags() {
        // 25 failures of 100 attempts = 25%, under 1.5x of the ceiling
        let anomaly = evaluate(&record(75, 25), 20.0).expect("should flag");
        assert_eq!(anomaly.value, 25.0);
        assert_eq!(anomaly.severity, Severity::Minor);
        assert_eq!(anomaly.details["total_attempts"], 100);
    }

    #[test]
    fn total_failure_is_critical() {
        // 100% failure against a 20% ceiling is a 5x ratio
        let anomaly = evaluate(&record(0, 40), 20.0).expect("should flag");
        assert_eq!(anomaly.severity, Severity::Critical);
    }
}

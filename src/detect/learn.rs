use crate::detect::engine::{DetectionWindow, Detector};
use crate::detect::scoring::{classify, safe_rate};
use crate::detect::thresholds::ThresholdSet;
use crate::detect::{Anomaly, Dimension};
use crate::metrics::{MetricRecord, MetricSource};
use anyhow::Result;
use std::sync::Arc;

/// Severity scale for the conversion deficit. The metric is "how far below
/// the floor", so the shortfall is scored against this fixed 10-point scale
/// rather than against the configured floor itself.
const LEARN_SEVERITY_SCALE: f64 = 10.0;

/// Flags supplier-days where too few logins convert into learning sessions.
pub struct LearnConversionDetector {
    source: Arc<dyn MetricSource>,
}

impl LearnConversionDetector {
    pub fn new(source: Arc<dyn MetricSource>) -> Self {
        Self { source }
    }
}

/// Evaluate one supplier-day. Needs both logins and learners on the day.
pub fn evaluate(record: &MetricRecord, threshold: f64) -> Option<Anomaly> {
    if record.learn_count == 0 {
        return None;
    }
    let rate = safe_rate(record.learn_count as f64, record.login_count as f64)?;
    // Lower bound: the violation direction is opposite to the other dimensions.
    if rate >= threshold {
        return None;
    }
    Some(Anomaly {
        dimension: Dimension::LearnConversion,
        severity: classify(threshold - rate, LEARN_SEVERITY_SCALE),
        subject: record.supplier.clone(),
        date: record.date,
        value: rate,
        threshold,
        description: format!("学习转化率异常: {:.2}% (阈值: {}%)", rate, threshold),
        details: serde_json::json!({
            "supplier": record.supplier,
            "date": record.date,
            "daily_login_count": record.login_count,
            "daily_learn_count": record.learn_count,
        }),
    })
}

#[async_trait::async_trait]
impl Detector for LearnConversionDetector {
    fn dimension(&self) -> Dimension {
        Dimension::LearnConversion
    }

    async fn detect(
        &self,
        window: &DetectionWindow,
        thresholds: &ThresholdSet,
    ) -> Result<Vec<Anomaly>> {
        let records = self.source.metrics_in_range(window.start, window.end).await?;
        Ok(records
            .iter()
            .filter_map(|r| evaluate(r, thresholds.learn_conversion_rate))
            .collect())
    }
}

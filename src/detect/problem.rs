use crate::detect::engine::{DetectionWindow, Detector};
use crate::detect::scoring::classify;
use crate::detect::thresholds::ThresholdSet;
use crate::detect::{Anomaly, Dimension};
use crate::metrics::{ProblemRecord, ProblemSource};
use anyhow::Result;
use std::sync::Arc;

/// Fixed subject label for problem-tracking anomalies; problems are not
/// tied to a single supplier the way daily metrics are.
const PROBLEM_SUBJECT: &str = "问题整改";

/// Flags uncorrected problems that have sat past their deadline too long.
pub struct ProblemOverdueDetector {
    source: Arc<dyn ProblemSource>,
}

impl ProblemOverdueDetector {
    pub fn new(source: Arc<dyn ProblemSource>) -> Self {
        Self { source }
    }
}

/// Evaluate one overdue problem against the grace-period threshold.
pub fn evaluate(problem: &ProblemRecord, today: chrono::NaiveDate, threshold: f64) -> Option<Anomaly> {
    // Negative remaining days are the overdue magnitude.
    let overdue_days = problem.remaining_days(today).abs();
    if overdue_days as f64 <= threshold {
        return None;
    }
    Some(Anomaly {
        dimension: Dimension::ProblemOverdue,
        severity: classify(overdue_days as f64, threshold),
        subject: PROBLEM_SUBJECT.to_string(),
        date: problem.deadline,
        value: overdue_days as f64,
        threshold,
        description: format!("问题整改超期: 已超期{}天 (阈值: {}天)", overdue_days, threshold),
        details: serde_json::json!({
            "problem_id": problem.id,
            "title": problem.title,
            "responsible": problem.responsible,
            "status": problem.status,
            "discovered_at": problem.discovered_at,
            "deadline": problem.deadline,
            "overdue_days": overdue_days,
        }),
    })
}

#[async_trait::async_trait]
impl Detector for ProblemOverdueDetector {
    fn dimension(&self) -> Dimension {
        Dimension::ProblemOverdue
    }

    async fn detect(
        &self,
        window: &DetectionWindow,
        thresholds: &ThresholdSet,
    ) -> Result<Vec<Anomaly>> {
        let problems = self.source.overdue_problems(window.today).await?;
        Ok(problems
            .iter()
            .filter_map(|p| evaluate(p, window.today, thresholds.problem_overdue_days))
            .collect())
    }
}

use crate::detect::cheat::CheatRateDetector;
use crate::detect::face::FaceFailDetector;
use crate::detect::learn::LearnConversionDetector;
use crate::detect::problem::ProblemOverdueDetector;
use crate::detect::thresholds::ThresholdSet;
use crate::detect::{Anomaly, DetectError, DetectionFilter, Dimension};
use crate::metrics::{MetricSource, ProblemSource};
use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

/// The time window a detection run looks at. `today` anchors the
/// overdue-days computation so runs are reproducible in tests.
#[derive(Debug, Clone, Copy)]
pub struct DetectionWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub today: NaiveDate,
}

/// One detection dimension. Detectors fetch their own records and return
/// anomalies; they never render or persist anything.
#[async_trait::async_trait]
pub trait Detector: Send + Sync {
    fn dimension(&self) -> Dimension;

    async fn detect(
        &self,
        window: &DetectionWindow,
        thresholds: &ThresholdSet,
    ) -> Result<Vec<Anomaly>>;
}

/// Runs the configured detectors over a window and concatenates their
/// output in a fixed order: cheat, face, learn, problem.
pub struct DetectionEngine {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectionEngine {
    pub fn new(metrics: Arc<dyn MetricSource>, problems: Arc<dyn ProblemSource>) -> Self {
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(CheatRateDetector::new(metrics.clone())),
            Box::new(FaceFailDetector::new(metrics.clone())),
            Box::new(LearnConversionDetector::new(metrics)),
            Box::new(ProblemOverdueDetector::new(problems)),
        ];
        Self { detectors }
    }

    pub async fn run(
        &self,
        window: &DetectionWindow,
        filter: DetectionFilter,
        thresholds: &ThresholdSet,
    ) -> Result<Vec<Anomaly>> {
        if window.start > window.end {
            return Err(DetectError::InvalidDateRange {
                start: window.start,
                end: window.end,
            }
            .into());
        }

        info!(start = %window.start, end = %window.end, "running anomaly detection");

        let mut anomalies = Vec::new();
        for detector in &self.detectors {
            if !filter.includes(detector.dimension()) {
                continue;
            }
            let found = detector.detect(window, thresholds).await?;
            info!(
                dimension = detector.dimension().key(),
                count = found.len(),
                "detector finished"
            );
            anomalies.extend(found);
        }
        Ok(anomalies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricRecord, ProblemRecord};

    struct FakeMetrics(Vec<MetricRecord>);

    #[async_trait::async_trait]
    impl MetricSource for FakeMetrics {
        async fn metrics_in_range(
            &self,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<MetricRecord>> {
            Ok(self.0.clone())
        }
    }

    struct FakeProblems(Vec<ProblemRecord>);

    #[async_trait::async_trait]
    impl ProblemSource for FakeProblems {
        async fn overdue_problems(&self, _today: NaiveDate) -> Result<Vec<ProblemRecord>> {
            Ok(self.0.clone())
        }
    }

    fn window() -> DetectionWindow {
        DetectionWindow {
            start: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
            today: NaiveDate::from_ymd_opt(2026, 7, 15).unwrap(),
        }
    }

    fn bad_day() -> MetricRecord {
        // Violates cheat (10%), face (50%) and conversion (33%) at defaults
        MetricRecord {
            supplier: "华信培训".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 7, 10).unwrap(),
            login_count: 300,
            learn_count: 100,
            cheat_count: 10,
            face_success_count: 50,
            face_fail_count: 50,
        }
    }

    fn overdue_problem() -> ProblemRecord {
        ProblemRecord {
            id: 7,
            title: "台账不全".to_string(),
            responsible: "赵主任".to_string(),
            status: "待整改".to_string(),
            discovered_at: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            deadline: NaiveDate::from_ymd_opt(2026, 7, 5).unwrap(),
        }
    }

    fn engine() -> DetectionEngine {
        DetectionEngine::new(
            Arc::new(FakeMetrics(vec![bad_day()])),
            Arc::new(FakeProblems(vec![overdue_problem()])),
        )
    }

    #[tokio::test]
    async fn results_come_back_in_fixed_dimension_order() {
        let anomalies = engine()
            .run(&window(), DetectionFilter::All, &ThresholdSet::default())
            .await
            .unwrap();
        let dims: Vec<Dimension> = anomalies.iter().map(|a| a.dimension).collect();
        assert_eq!(
            dims,
            vec![
                Dimension::CheatRate,
                Dimension::FaceFail,
                Dimension::LearnConversion,
                Dimension::ProblemOverdue,
            ]
        );
    }

    #[tokio::test]
    async fn filter_runs_a_single_detector() {
        let anomalies = engine()
            .run(&window(), DetectionFilter::Problem, &ThresholdSet::default())
            .await
            .unwrap();
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].dimension, Dimension::ProblemOverdue);
    }

    #[tokio::test]
    async fn inverted_range_is_rejected_before_detection() {
        let mut w = window();
        w.start = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let err = engine()
            .run(&w, DetectionFilter::All, &ThresholdSet::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid date range"));
    }
}

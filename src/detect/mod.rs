//! Anomaly detection over daily supervision metrics.

pub mod cheat;
pub mod engine;
pub mod face;
pub mod learn;
pub mod problem;
pub mod scoring;
pub mod thresholds;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("unknown detection type '{0}' (expected all|cheat|face|learn|problem)")]
    UnknownDetectionType(String),

    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// Severity tiers for detected anomalies, ordered minor -> critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "轻微")]
    Minor,
    #[serde(rename = "一般")]
    Moderate,
    #[serde(rename = "重要")]
    Major,
    #[serde(rename = "严重")]
    Critical,
}

impl Severity {
    /// Presentation order: most severe first.
    pub const PRIORITY_ORDER: [Severity; 4] = [
        Severity::Critical,
        Severity::Major,
        Severity::Moderate,
        Severity::Minor,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Minor => "轻微",
            Severity::Moderate => "一般",
            Severity::Major => "重要",
            Severity::Critical => "严重",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The four detection dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "cheat_rate")]
    CheatRate,
    #[serde(rename = "face_fail_rate")]
    FaceFail,
    #[serde(rename = "learn_conversion_rate")]
    LearnConversion,
    #[serde(rename = "problem_overdue")]
    ProblemOverdue,
}

impl Dimension {
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::CheatRate => "cheat_rate",
            Dimension::FaceFail => "face_fail_rate",
            Dimension::LearnConversion => "learn_conversion_rate",
            Dimension::ProblemOverdue => "problem_overdue",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::CheatRate => "作弊率",
            Dimension::FaceFail => "人脸识别失败率",
            Dimension::LearnConversion => "学习转化率",
            Dimension::ProblemOverdue => "问题整改超期",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single threshold violation with full context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub dimension: Dimension,
    pub severity: Severity,
    /// Supplier name, or a fixed label for problem-tracking anomalies.
    pub subject: String,
    pub date: NaiveDate,
    pub value: f64,
    pub threshold: f64,
    pub description: String,
    /// Raw inputs that produced the value, for traceability.
    pub details: serde_json::Value,
}

/// Which detectors a run consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionFilter {
    All,
    Cheat,
    Face,
    Learn,
    Problem,
}

impl DetectionFilter {
    pub fn includes(&self, dimension: Dimension) -> bool {
        match self {
            DetectionFilter::All => true,
            DetectionFilter::Cheat => dimension == Dimension::CheatRate,
            DetectionFilter::Face => dimension == Dimension::FaceFail,
            DetectionFilter::Learn => dimension == Dimension::LearnConversion,
            DetectionFilter::Problem => dimension == Dimension::ProblemOverdue,
        }
    }
}

impl FromStr for DetectionFilter {
    type Err = DetectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(DetectionFilter::All),
            "cheat" => Ok(DetectionFilter::Cheat),
            "face" => Ok(DetectionFilter::Face),
            "learn" => Ok(DetectionFilter::Learn),
            "problem" => Ok(DetectionFilter::Problem),
            other => Err(DetectError::UnknownDetectionType(other.to_string())),
        }
    }
}

//! Grouping and summarization of detection output.
//!
//! Pure view transformation; terminal rendering lives in the CLI.

use crate::detect::{Anomaly, Dimension, Severity};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SeverityGroup {
    pub severity: Severity,
    pub anomalies: Vec<Anomaly>,
}

#[derive(Debug, Serialize)]
pub struct TypeCount {
    pub dimension: Dimension,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    /// Non-empty severity groups, most severe first.
    pub by_severity: Vec<SeverityGroup>,
    /// Per-dimension counts in order of first occurrence.
    pub by_type: Vec<TypeCount>,
}

pub fn aggregate(anomalies: Vec<Anomaly>) -> Summary {
    let total = anomalies.len();

    let mut by_type: Vec<TypeCount> = Vec::new();
    for anomaly in &anomalies {
        match by_type.iter_mut().find(|t| t.dimension == anomaly.dimension) {
            Some(entry) => entry.count += 1,
            None => by_type.push(TypeCount {
                dimension: anomaly.dimension,
                count: 1,
            }),
        }
    }

    let mut by_severity = Vec::new();
    for severity in Severity::PRIORITY_ORDER {
        let group: Vec<Anomaly> = anomalies
            .iter()
            .filter(|a| a.severity == severity)
            .cloned()
            .collect();
        if group.is_empty() {
            continue;
        }
        by_severity.push(SeverityGroup {
            severity,
            anomalies: group,
        });
    }

    Summary {
        total,
        by_severity,
        by_type,
    }
}

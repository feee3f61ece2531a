use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One supplier-day of raw supervision counts.
///
/// All counts are non-negative; rates are derived downstream, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRecord {
    pub supplier: String,
    pub date: NaiveDate,
    pub login_count: u64,
    pub learn_count: u64,
    pub cheat_count: u64,
    pub face_success_count: u64,
    pub face_fail_count: u64,
}

/// A tracked remediation problem with a correction deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub id: i64,
    pub title: String,
    pub responsible: String,
    pub status: String,
    pub discovered_at: NaiveDate,
    pub deadline: NaiveDate,
}

/// Statuses that close out a problem; anything else past deadline is overdue.
pub const CORRECTED_STATUSES: [&str; 2] = ["已整改", "已验收"];

impl ProblemRecord {
    /// Signed days until the deadline. Negative means the deadline has passed.
    pub fn remaining_days(&self, today: NaiveDate) -> i64 {
        (self.deadline - today).num_days()
    }
}

/// Supplies daily metric records for a detection window.
#[async_trait::async_trait]
pub trait MetricSource: Send + Sync {
    /// Fetch all records with `start <= date <= end`.
    async fn metrics_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<MetricRecord>>;
}

/// Supplies problems that are currently overdue for correction.
#[async_trait::async_trait]
pub trait ProblemSource: Send + Sync {
    /// Fetch problems whose status is not terminal and whose deadline is before `today`.
    async fn overdue_problems(&self, today: NaiveDate) -> Result<Vec<ProblemRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_days_is_signed() {
        let p = ProblemRecord {
            id: 1,
            title: "消防通道堵塞".to_string(),
            responsible: "王主管".to_string(),
            status: "待整改".to_string(),
            discovered_at: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            deadline: NaiveDate::from_ymd_opt(2026, 7, 10).unwrap(),
        };
        let before = NaiveDate::from_ymd_opt(2026, 7, 8).unwrap();
        let after = NaiveDate::from_ymd_opt(2026, 7, 15).unwrap();
        assert_eq!(p.remaining_days(before), 2);
        assert_eq!(p.remaining_days(after), -5);
    }
}

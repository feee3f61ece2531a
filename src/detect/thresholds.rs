//! Effective detection thresholds: process-wide defaults plus caller overrides.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Cheat rate ceiling, percent of daily learners.
pub const DEFAULT_CHEAT_RATE: f64 = 5.0;

/// Face-recognition failure ceiling, percent of attempts.
pub const DEFAULT_FACE_FAIL_RATE: f64 = 20.0;

/// Login-to-learn conversion floor, percent. Lower bound, unlike the others.
pub const DEFAULT_LEARN_CONVERSION_RATE: f64 = 50.0;

/// Days past a correction deadline before a problem is flagged.
pub const DEFAULT_PROBLEM_OVERDUE_DAYS: f64 = 3.0;

/// New-classroom growth ceiling, percent. Merged but not consumed by any
/// built-in detector.
pub const DEFAULT_NEW_CLASSROOM_RATIO: f64 = 100.0;

/// The numeric limits used for violation comparison in one detection run.
///
/// Built fresh per run from defaults + optional overrides, immutable after.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdSet {
    pub cheat_rate: f64,
    pub face_fail_rate: f64,
    pub learn_conversion_rate: f64,
    pub problem_overdue_days: f64,
    pub new_classroom_ratio: f64,
    /// Unrecognized override keys, preserved for forward compatibility.
    pub extra: BTreeMap<String, f64>,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            cheat_rate: DEFAULT_CHEAT_RATE,
            face_fail_rate: DEFAULT_FACE_FAIL_RATE,
            learn_conversion_rate: DEFAULT_LEARN_CONVERSION_RATE,
            problem_overdue_days: DEFAULT_PROBLEM_OVERDUE_DAYS,
            new_classroom_ratio: DEFAULT_NEW_CLASSROOM_RATIO,
            extra: BTreeMap::new(),
        }
    }
}

/// Parse an override document: a flat JSON object of key -> number.
pub fn parse_overrides(text: &str) -> Result<BTreeMap<String, f64>, serde_json::Error> {
    serde_json::from_str(text)
}

impl ThresholdSet {
    /// Build the effective set from defaults plus an optional JSON override
    /// document. Malformed overrides are non-fatal: log a warning and keep
    /// the defaults.
    pub fn resolve(overrides: Option<&str>) -> Self {
        let Some(text) = overrides else {
            return Self::default();
        };
        match parse_overrides(text) {
            Ok(map) => Self::default().apply(map),
            Err(e) => {
                warn!(error = %e, "malformed threshold overrides, falling back to defaults");
                Self::default()
            }
        }
    }

    /// Shallow-merge an override map onto this set. Keys absent from the map
    /// keep their current value.
    pub fn apply(mut self, overrides: BTreeMap<String, f64>) -> Self {
        for (key, value) in overrides {
            match key.as_str() {
                "cheat_rate" => self.cheat_rate = value,
                "face_fail_rate" => self.face_fail_rate = value,
                "learn_conversion_rate" => self.learn_conversion_rate = value,
                "problem_overdue_days" => self.problem_overdue_days = value,
                "new_classroom_ratio" => self.new_classroom_ratio = value,
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_overrides_yields_defaults() {
        assert_eq!(ThresholdSet::resolve(None), ThresholdSet::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let set = ThresholdSet::resolve(Some(r#"{"cheat_rate": 10}"#));
        assert_eq!(set.cheat_rate, 10.0);
        assert_eq!(set.face_fail_rate, DEFAULT_FACE_FAIL_RATE);
        assert_eq!(set.learn_conversion_rate, DEFAULT_LEARN_CONVERSION_RATE);
        assert_eq!(set.problem_overdue_days, DEFAULT_PROBLEM_OVERDUE_DAYS);
        assert_eq!(set.new_classroom_ratio, DEFAULT_NEW_CLASSROOM_RATIO);
    }

    #[test]
    fn malformed_overrides_fall_back_to_defaults() {
        let set = ThresholdSet::resolve(Some("{not json"));
        assert_eq!(set, ThresholdSet::default());
    }

    #[test]
    fn unrecognized_keys_are_preserved() {
        let set = ThresholdSet::resolve(Some(r#"{"video_skip_rate": 15.5, "face_fail_rate": 30}"#));
        assert_eq!(set.face_fail_rate, 30.0);
        assert_eq!(set.extra.get("video_skip_rate"), Some(&15.5));
    }
}

//! Rate derivation and severity classification.

use super::Severity;

/// Percentage ratio with a shared zero-denominator guard.
///
/// Returns `None` when the denominator is not positive; callers skip the
/// record instead of emitting a false anomaly.
pub fn safe_rate(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator <= 0.0 {
        return None;
    }
    Some(numerator / denominator * 100.0)
}

/// Map how far a value sits above its threshold to a severity tier.
///
/// ratio >= 3.0 -> 严重, >= 2.0 -> 重要, >= 1.5 -> 一般, below -> 轻微.
/// A non-positive threshold cannot form a ratio: any positive observed
/// value is treated as critical, anything else as minor.
pub fn classify(observed: f64, threshold: f64) -> Severity {
    if threshold <= 0.0 {
        return if observed > 0.0 {
            Severity::Critical
        } else {
            Severity::Minor
        };
    }

    let ratio = observed / threshold;
    if ratio >= 3.0 {
        Severity::Critical
    } else if ratio >= 2.0 {
        Severity::Major
    } else if ratio >= 1.5 {
        Severity::Moderate
    } else {
        Severity::Minor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_rate_guards_zero_denominator() {
        assert_eq!(safe_rate(10.0, 0.0), None);
        assert_eq!(safe_rate(10.0, -1.0), None);
        assert_eq!(safe_rate(10.0, 100.0), Some(10.0));
    }

    #[test]
    fn classify_tier_boundaries() {
        assert_eq!(classify(5.0, 5.0), Severity::Minor);
        assert_eq!(classify(7.5, 5.0), Severity::Moderate);
        assert_eq!(classify(10.0, 5.0), Severity::Major);
        assert_eq!(classify(15.0, 5.0), Severity::Critical);
    }

    #[test]
    fn classify_is_monotonic_in_observed_value() {
        let threshold = 20.0;
        let mut last = Severity::Minor;
        for step in 0..200 {
            let observed = step as f64 * 0.5;
            let tier = classify(observed, threshold);
            assert!(tier >= last, "tier regressed at observed={observed}");
            last = tier;
        }
    }

    #[test]
    fn classify_zero_threshold_policy() {
        assert_eq!(classify(0.1, 0.0), Severity::Critical);
        assert_eq!(classify(0.0, 0.0), Severity::Minor);
    }
}

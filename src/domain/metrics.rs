//! Daily account-level performance metrics, ingested from platform exports.

use serde::{Deserialize, Serialize};

/// One day of account metrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayMetrics {
    /// Day key, "YYYY-MM-DD"
    pub day: String,
    /// Total views across posts that day
    pub views: u64,
    /// Share of viewers still watching at 2 seconds, in [0, 1]
    pub view2s_rate: f64,
}

impl DayMetrics {
    pub fn new(day: impl Into<String>, views: u64, view2s_rate: f64) -> Self {
        Self {
            day: day.into(),
            views,
            view2s_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_metrics_roundtrip() {
        let m = DayMetrics::new("2025-06-01", 1200, 0.62);
        let json = serde_json::to_string(&m).unwrap();
        let back: DayMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}

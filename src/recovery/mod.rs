//! Account-health circuit breaker.
//!
//! Compares recent daily metrics against a trailing baseline and, when
//! performance drops past the configured thresholds (or spam errors pile
//! up), flips the whole planner into a throttled recovery posture: fewer
//! posts, no montages, no comment CTAs, fewer hashtags.

use crate::config::{RecoveryConfig, RuleConfig};
use crate::domain::{Container, CtaKind, DayMetrics};

/// How many most-recent days form the "current" window.
pub const METRICS_CURRENT_DAYS: usize = 3;
/// How many preceding days form the baseline.
pub const METRICS_BASELINE_DAYS: usize = 7;

/// Snapshot of the breaker evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryStatus {
    pub active: bool,
    /// Relative drop of median views, in [0, 1]
    pub views_drop: f64,
    /// Relative drop of median 2-second retention, in [0, 1]
    pub view2s_drop: f64,
    pub spam_errors: u32,
}

/// Evaluates recent metrics and rewrites the rules while recovering.
pub struct RecoveryMonitor {
    thresholds: RecoveryConfig,
}

impl RecoveryMonitor {
    pub fn new(thresholds: RecoveryConfig) -> Self {
        Self { thresholds }
    }

    /// Evaluate the breaker against daily metrics sorted most-recent-first.
    ///
    /// The current window is the last 3 days; the baseline is the 7 days
    /// before those. A missing or zero baseline never counts as a drop.
    pub fn status(&self, daily: &[DayMetrics], spam_errors: u32) -> RecoveryStatus {
        let current_views: Vec<f64> = daily.iter().take(METRICS_CURRENT_DAYS).map(|m| m.views as f64).collect();
        let baseline_views: Vec<f64> = daily
            .iter()
            .skip(METRICS_CURRENT_DAYS)
            .take(METRICS_BASELINE_DAYS)
            .map(|m| m.views as f64)
            .collect();
        let current_view2s: Vec<f64> = daily.iter().take(METRICS_CURRENT_DAYS).map(|m| m.view2s_rate).collect();
        let baseline_view2s: Vec<f64> = daily
            .iter()
            .skip(METRICS_CURRENT_DAYS)
            .take(METRICS_BASELINE_DAYS)
            .map(|m| m.view2s_rate)
            .collect();

        let views_drop = drop_ratio(median(&current_views), median(&baseline_views));
        let view2s_drop = drop_ratio(median(&current_view2s), median(&baseline_view2s));
        let active = views_drop > self.thresholds.views_drop_threshold
            || view2s_drop > self.thresholds.view2s_drop_threshold
            || spam_errors >= self.thresholds.spam_error_threshold;

        if active {
            tracing::warn!(views_drop, view2s_drop, spam_errors, "Recovery mode active");
        }

        RecoveryStatus {
            active,
            views_drop,
            view2s_drop,
            spam_errors,
        }
    }

    /// Rules the planner should actually run with.
    ///
    /// Returns `base` untouched while the breaker is idle.
    pub fn effective_rules(&self, base: &RuleConfig, status: &RecoveryStatus) -> RuleConfig {
        let mut rules = base.clone();
        if !status.active {
            return rules;
        }

        rules.posts_per_day = rules.posts_per_day.min(self.thresholds.posts_per_day);
        if !self.thresholds.allow_montage {
            rules.allowed_containers.retain(|c| *c != Container::Montage);
        }
        if !self.thresholds.allow_comment_ctas {
            rules.allowed_cta_kinds.retain(|k| *k != CtaKind::Comment);
            rules.cooldowns.max_comment_ctas_per_day = 0;
        }
        rules.hashtags.max_per_post = rules.hashtags.max_per_post.min(self.thresholds.max_hashtags);

        tracing::info!(
            posts_per_day = rules.posts_per_day,
            containers = ?rules.allowed_containers,
            max_hashtags = rules.hashtags.max_per_post,
            "Applied recovery overrides"
        );
        rules
    }
}

fn drop_ratio(current: f64, baseline: f64) -> f64 {
    if baseline <= 0.0 {
        return 0.0;
    }
    (1.0 - current / baseline).max(0.0)
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

//! Per-arm reward statistics and the in-memory book the selector reads.

use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which plan dimension an arm belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ArmType {
    Recipe,
    Cta,
    Container,
    Clip,
    SnippetStrategy,
    ClipCategory,
    /// Reserved for externally ingested A/B variants
    Variant,
}

impl ArmType {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArmType::Recipe => "recipe",
            ArmType::Cta => "cta",
            ArmType::Container => "container",
            ArmType::Clip => "clip",
            ArmType::SnippetStrategy => "snippet-strategy",
            ArmType::ClipCategory => "clip-category",
            ArmType::Variant => "variant",
        }
    }

    /// Parse from the string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "recipe" => Some(ArmType::Recipe),
            "cta" => Some(ArmType::Cta),
            "container" => Some(ArmType::Container),
            "clip" => Some(ArmType::Clip),
            "snippet-strategy" => Some(ArmType::SnippetStrategy),
            "clip-category" => Some(ArmType::ClipCategory),
            "variant" => Some(ArmType::Variant),
            _ => None,
        }
    }
}

impl std::fmt::Display for ArmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cumulative statistics for one arm.
///
/// `pulls` and `uses_today` move when the planner commits a slot; reward and
/// outcome fields move later, when performance data is ingested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArmStats {
    pub arm_type: ArmType,
    pub arm_id: String,
    pub pulls: u64,
    pub reward_sum: f64,
    pub impressions: u64,
    pub conversions: u64,
    pub uses_today: u32,
    /// Millis timestamp of the last `uses_today` day rollover
    pub last_reset_at: i64,
}

impl ArmStats {
    /// Create zeroed stats for an arm.
    pub fn new(arm_type: ArmType, arm_id: impl Into<String>) -> Self {
        Self {
            arm_type,
            arm_id: arm_id.into(),
            pulls: 0,
            reward_sum: 0.0,
            impressions: 0,
            conversions: 0,
            uses_today: 0,
            last_reset_at: 0,
        }
    }

    /// Prior-shrunk mean reward.
    ///
    /// Never raw `reward_sum / pulls`: the prior pseudo-count pulls small
    /// samples toward `prior_mean` so one lucky post cannot dominate.
    pub fn shrunk_mean(&self, prior_mean: f64, effective_prior: f64) -> f64 {
        (self.reward_sum + prior_mean * effective_prior) / (self.pulls as f64 + effective_prior).max(1.0)
    }

    /// Record one planner pull at `now_ms`, rolling `uses_today` across
    /// Utc day boundaries.
    pub fn record_pull(&mut self, now_ms: i64) {
        if utc_day(now_ms) != utc_day(self.last_reset_at) {
            self.uses_today = 0;
            self.last_reset_at = now_ms;
        }
        self.pulls += 1;
        self.uses_today += 1;
    }

    /// Add an ingested reward observation.
    pub fn record_reward(&mut self, reward: f64) {
        self.reward_sum += reward;
    }

    /// Add ingested impression/conversion counts.
    pub fn record_outcome(&mut self, impressions: u64, conversions: u64) {
        self.impressions += impressions;
        self.conversions += conversions;
    }
}

fn utc_day(ms: i64) -> NaiveDate {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.date_naive())
        .unwrap_or_default()
}

/// In-memory view of all arm statistics for one planning batch.
///
/// Loaded from the stats store at batch start; pulls recorded here are
/// flushed back through the store as slots commit.
#[derive(Debug, Clone, Default)]
pub struct StatsBook {
    arms: HashMap<ArmType, HashMap<String, ArmStats>>,
}

impl StatsBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from persisted stats rows.
    pub fn from_stats(stats: Vec<ArmStats>) -> Self {
        let mut book = Self::new();
        for s in stats {
            book.arms.entry(s.arm_type).or_default().insert(s.arm_id.clone(), s);
        }
        book
    }

    /// Stats for one arm, if any pulls or rewards were ever recorded.
    pub fn get(&self, arm_type: ArmType, arm_id: &str) -> Option<&ArmStats> {
        self.arms.get(&arm_type).and_then(|m| m.get(arm_id))
    }

    /// Pull count for one arm, zero when unseen.
    pub fn pulls(&self, arm_type: ArmType, arm_id: &str) -> u64 {
        self.get(arm_type, arm_id).map(|s| s.pulls).unwrap_or(0)
    }

    /// Record a pull, creating the arm on first sight. Returns a snapshot
    /// of the updated stats for persistence.
    pub fn record_pull(&mut self, arm_type: ArmType, arm_id: &str, now_ms: i64) -> ArmStats {
        let stats = self
            .arms
            .entry(arm_type)
            .or_default()
            .entry(arm_id.to_string())
            .or_insert_with(|| ArmStats::new(arm_type, arm_id));
        stats.record_pull(now_ms);
        stats.clone()
    }

    /// Iterate all known arms.
    pub fn all(&self) -> impl Iterator<Item = &ArmStats> {
        self.arms.values().flat_map(|m| m.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    #[test]
    fn test_shrunk_mean_pulls_toward_prior() {
        let mut stats = ArmStats::new(ArmType::Recipe, "r1");
        stats.pulls = 1;
        stats.reward_sum = 1.0;
        // One perfect observation against an 8-weight 0.5 prior stays near 0.5
        let mean = stats.shrunk_mean(0.5, 8.0);
        assert!(mean < 0.6, "mean {mean} should be shrunk toward prior");
        assert!(mean > 0.5);

        stats.pulls = 200;
        stats.reward_sum = 200.0;
        let mean = stats.shrunk_mean(0.5, 8.0);
        assert!(mean > 0.95, "mean {mean} should approach raw mean with volume");
    }

    #[test]
    fn test_shrunk_mean_zero_pulls_is_prior() {
        let stats = ArmStats::new(ArmType::Cta, "c1");
        let mean = stats.shrunk_mean(0.5, 8.0);
        assert!((mean - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_record_pull_counts() {
        let mut stats = ArmStats::new(ArmType::Container, "montage");
        let now = 1_700_000_000_000;
        stats.record_pull(now);
        stats.record_pull(now + 1000);
        assert_eq!(stats.pulls, 2);
        assert_eq!(stats.uses_today, 2);
    }

    #[test]
    fn test_uses_today_resets_across_day_boundary() {
        let mut stats = ArmStats::new(ArmType::Recipe, "r1");
        let day1 = 1_700_000_000_000;
        stats.record_pull(day1);
        stats.record_pull(day1 + 1000);
        assert_eq!(stats.uses_today, 2);

        stats.record_pull(day1 + 2 * DAY_MS);
        assert_eq!(stats.uses_today, 1);
        assert_eq!(stats.pulls, 3);
    }

    #[test]
    fn test_book_pulls_default_zero() {
        let book = StatsBook::new();
        assert_eq!(book.pulls(ArmType::Clip, "unknown"), 0);
        assert!(book.get(ArmType::Clip, "unknown").is_none());
    }

    #[test]
    fn test_book_record_and_lookup() {
        let mut book = StatsBook::new();
        let snapshot = book.record_pull(ArmType::Recipe, "r1", 1_700_000_000_000);
        assert_eq!(snapshot.pulls, 1);
        assert_eq!(book.pulls(ArmType::Recipe, "r1"), 1);
        // Same id under a different type is a different arm
        assert_eq!(book.pulls(ArmType::Cta, "r1"), 0);
    }

    #[test]
    fn test_book_from_stats() {
        let mut seeded = ArmStats::new(ArmType::Recipe, "r1");
        seeded.pulls = 12;
        seeded.reward_sum = 7.5;
        let book = StatsBook::from_stats(vec![seeded.clone()]);
        assert_eq!(book.get(ArmType::Recipe, "r1"), Some(&seeded));
        assert_eq!(book.all().count(), 1);
    }

    #[test]
    fn test_arm_type_parse_roundtrip() {
        for t in [
            ArmType::Recipe,
            ArmType::Cta,
            ArmType::Container,
            ArmType::Clip,
            ArmType::SnippetStrategy,
            ArmType::ClipCategory,
            ArmType::Variant,
        ] {
            assert_eq!(ArmType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ArmType::parse("nope"), None);
    }
}

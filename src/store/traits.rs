//! Store trait seams the planner and CLI run against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::bandit::{ArmStats, StatsBook};
use crate::domain::{Clip, Cta, DayMetrics, Plan, PlanStatus, Recipe, Snippet, Track};
use crate::error::Result;

/// Read and upsert access to the content catalog.
///
/// The planner only reads; upserts back the `import` command.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn clips(&self) -> Result<Vec<Clip>>;
    async fn snippets(&self) -> Result<Vec<Snippet>>;
    async fn tracks(&self) -> Result<Vec<Track>>;
    async fn recipes(&self) -> Result<Vec<Recipe>>;
    async fn ctas(&self) -> Result<Vec<Cta>>;

    async fn put_clip(&self, clip: &Clip) -> Result<()>;
    async fn put_snippet(&self, snippet: &Snippet) -> Result<()>;
    async fn put_track(&self, track: &Track) -> Result<()>;
    async fn put_recipe(&self, recipe: &Recipe) -> Result<()>;
    async fn put_cta(&self, cta: &Cta) -> Result<()>;
}

/// Plan history and creation.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Persist a newly committed plan. Plans are never mutated afterwards
    /// except for status transitions.
    async fn create_plan(&self, plan: &Plan) -> Result<()>;

    async fn plan(&self, id: &str) -> Result<Option<Plan>>;

    /// Plans scheduled at or after `since`, newest first. Future-scheduled
    /// plans are included so queued posts count as recent.
    async fn plans_since(&self, since: DateTime<Utc>) -> Result<Vec<Plan>>;

    /// Most recently created plans, newest first.
    async fn recent_plans(&self, limit: usize) -> Result<Vec<Plan>>;

    async fn set_plan_status(&self, id: &str, status: PlanStatus) -> Result<()>;
}

/// Bandit arm statistics.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Load every persisted arm into one in-memory book.
    async fn stats_book(&self) -> Result<StatsBook>;

    async fn upsert_arm(&self, stats: &ArmStats) -> Result<()>;
}

/// Daily account metrics and the spam/error log feeding the breaker.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    async fn upsert_day_metrics(&self, metrics: &DayMetrics) -> Result<()>;

    /// Up to `days` most recent entries, newest first.
    async fn recent_day_metrics(&self, days: usize) -> Result<Vec<DayMetrics>>;

    async fn record_error(&self, kind: &str, message: &str) -> Result<()>;

    async fn error_count_since(&self, since: DateTime<Utc>) -> Result<u32>;
}

/// Everything a planning run needs from persistence.
pub trait PipelineStore: CatalogStore + PlanStore + StatsStore + MetricsStore {}

impl<T: CatalogStore + PlanStore + StatsStore + MetricsStore> PipelineStore for T {}

//! In-memory store used by tests and dry runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

use crate::bandit::{ArmStats, StatsBook};
use crate::domain::{Clip, Cta, DayMetrics, Plan, PlanStatus, Recipe, Snippet, Track};
use crate::error::{PlannerError, Result};
use crate::id::now_ms;
use crate::store::{CatalogStore, MetricsStore, PlanStore, StatsStore};

/// Volatile [`SqliteStore`](crate::store::SqliteStore) stand-in with the
/// same observable behavior.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    clips: Vec<Clip>,
    snippets: Vec<Snippet>,
    tracks: Vec<Track>,
    recipes: Vec<Recipe>,
    ctas: Vec<Cta>,
    plans: Vec<Plan>,
    arms: Vec<ArmStats>,
    metrics: Vec<DayMetrics>,
    errors: Vec<(i64, String, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pre-loaded catalog.
    pub fn with_catalog(
        clips: Vec<Clip>,
        snippets: Vec<Snippet>,
        tracks: Vec<Track>,
        recipes: Vec<Recipe>,
        ctas: Vec<Cta>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                clips,
                snippets,
                tracks,
                recipes,
                ctas,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| PlannerError::Storage("Store lock poisoned".to_string()))
    }
}

fn upsert_by_id<T: Clone>(rows: &mut Vec<T>, entity: &T, same: impl Fn(&T) -> bool) {
    match rows.iter_mut().find(|row| same(row)) {
        Some(row) => *row = entity.clone(),
        None => rows.push(entity.clone()),
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn clips(&self) -> Result<Vec<Clip>> {
        Ok(self.lock()?.clips.clone())
    }

    async fn snippets(&self) -> Result<Vec<Snippet>> {
        Ok(self.lock()?.snippets.clone())
    }

    async fn tracks(&self) -> Result<Vec<Track>> {
        Ok(self.lock()?.tracks.clone())
    }

    async fn recipes(&self) -> Result<Vec<Recipe>> {
        Ok(self.lock()?.recipes.clone())
    }

    async fn ctas(&self) -> Result<Vec<Cta>> {
        Ok(self.lock()?.ctas.clone())
    }

    async fn put_clip(&self, clip: &Clip) -> Result<()> {
        upsert_by_id(&mut self.lock()?.clips, clip, |c| c.id == clip.id);
        Ok(())
    }

    async fn put_snippet(&self, snippet: &Snippet) -> Result<()> {
        upsert_by_id(&mut self.lock()?.snippets, snippet, |s| s.id == snippet.id);
        Ok(())
    }

    async fn put_track(&self, track: &Track) -> Result<()> {
        upsert_by_id(&mut self.lock()?.tracks, track, |t| t.id == track.id);
        Ok(())
    }

    async fn put_recipe(&self, recipe: &Recipe) -> Result<()> {
        upsert_by_id(&mut self.lock()?.recipes, recipe, |r| r.id == recipe.id);
        Ok(())
    }

    async fn put_cta(&self, cta: &Cta) -> Result<()> {
        upsert_by_id(&mut self.lock()?.ctas, cta, |c| c.id == cta.id);
        Ok(())
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn create_plan(&self, plan: &Plan) -> Result<()> {
        upsert_by_id(&mut self.lock()?.plans, plan, |p| p.id == plan.id);
        Ok(())
    }

    async fn plan(&self, id: &str) -> Result<Option<Plan>> {
        Ok(self.lock()?.plans.iter().find(|p| p.id == id).cloned())
    }

    async fn plans_since(&self, since: DateTime<Utc>) -> Result<Vec<Plan>> {
        let mut plans: Vec<Plan> = self
            .lock()?
            .plans
            .iter()
            .filter(|p| p.scheduled_at >= since)
            .cloned()
            .collect();
        plans.sort_by_key(|p| std::cmp::Reverse(p.scheduled_at));
        Ok(plans)
    }

    async fn recent_plans(&self, limit: usize) -> Result<Vec<Plan>> {
        let mut plans = self.lock()?.plans.clone();
        plans.sort_by_key(|p| std::cmp::Reverse(p.created_at));
        plans.truncate(limit);
        Ok(plans)
    }

    async fn set_plan_status(&self, id: &str, status: PlanStatus) -> Result<()> {
        let mut inner = self.lock()?;
        let plan = inner
            .plans
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PlannerError::PlanNotFound(id.to_string()))?;
        plan.status = status;
        Ok(())
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    async fn stats_book(&self) -> Result<StatsBook> {
        Ok(StatsBook::from_stats(self.lock()?.arms.clone()))
    }

    async fn upsert_arm(&self, stats: &ArmStats) -> Result<()> {
        upsert_by_id(&mut self.lock()?.arms, stats, |a| {
            a.arm_type == stats.arm_type && a.arm_id == stats.arm_id
        });
        Ok(())
    }
}

#[async_trait]
impl MetricsStore for MemoryStore {
    async fn upsert_day_metrics(&self, metrics: &DayMetrics) -> Result<()> {
        upsert_by_id(&mut self.lock()?.metrics, metrics, |m| m.day == metrics.day);
        Ok(())
    }

    async fn recent_day_metrics(&self, days: usize) -> Result<Vec<DayMetrics>> {
        let mut metrics = self.lock()?.metrics.clone();
        metrics.sort_by(|a, b| b.day.cmp(&a.day));
        metrics.truncate(days);
        Ok(metrics)
    }

    async fn record_error(&self, kind: &str, message: &str) -> Result<()> {
        self.lock()?.errors.push((now_ms(), kind.to_string(), message.to_string()));
        Ok(())
    }

    async fn error_count_since(&self, since: DateTime<Utc>) -> Result<u32> {
        let floor = since.timestamp_millis();
        Ok(self.lock()?.errors.iter().filter(|(at, _, _)| *at >= floor).count() as u32)
    }
}

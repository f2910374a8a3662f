//! SQLite-backed store.
//!
//! Every entity is persisted as a `json_data` blob alongside the columns
//! queries filter on. Rows are written with `INSERT OR REPLACE`, so
//! upserts and catalog re-imports are idempotent.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::bandit::{ArmStats, StatsBook};
use crate::domain::{Clip, Cta, DayMetrics, Plan, PlanStatus, Recipe, Snippet, Track};
use crate::error::{PlannerError, Result};
use crate::id::now_ms;
use crate::store::{CatalogStore, MetricsStore, PlanStore, StatsStore};

/// Store rooted at `~/.reelplan/<account-hash>/`.
pub struct SqliteStore {
    base_dir: PathBuf,
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the store for an account.
    pub fn open(account: &str, store_dir: Option<&Path>) -> Result<Self> {
        let base_dir = match store_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::home_dir()
                .ok_or_else(|| PlannerError::Storage("Cannot determine home directory".to_string()))?
                .join(".reelplan")
                .join(compute_account_hash(account)),
        };
        Self::open_at(&base_dir)
    }

    /// Open or create a store at a specific directory.
    ///
    /// Useful for testing with custom paths.
    pub fn open_at(base_dir: &Path) -> Result<Self> {
        fs::create_dir_all(base_dir)?;
        let db_path = base_dir.join("reelplan.db");
        let db = Connection::open(&db_path)
            .map_err(|e| PlannerError::Storage(format!("Failed to open {}: {e}", db_path.display())))?;
        Self::init_schema(&db)?;

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            db: Mutex::new(db),
        })
    }

    fn init_schema(db: &Connection) -> Result<()> {
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS plans (
                id TEXT PRIMARY KEY,
                scheduled_at INTEGER NOT NULL,
                container TEXT NOT NULL,
                recipe_id TEXT NOT NULL,
                track_id TEXT NOT NULL,
                snippet_id TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                json_data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_plans_scheduled ON plans(scheduled_at);
            CREATE INDEX IF NOT EXISTS idx_plans_status ON plans(status);
            CREATE INDEX IF NOT EXISTS idx_plans_created ON plans(created_at);

            CREATE TABLE IF NOT EXISTS arm_stats (
                arm_type TEXT NOT NULL,
                arm_id TEXT NOT NULL,
                json_data TEXT NOT NULL,
                PRIMARY KEY (arm_type, arm_id)
            );

            CREATE TABLE IF NOT EXISTS clips (id TEXT PRIMARY KEY, json_data TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS snippets (id TEXT PRIMARY KEY, json_data TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS tracks (id TEXT PRIMARY KEY, json_data TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS recipes (id TEXT PRIMARY KEY, json_data TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS ctas (id TEXT PRIMARY KEY, json_data TEXT NOT NULL);

            CREATE TABLE IF NOT EXISTS day_metrics (
                day TEXT PRIMARY KEY,
                views INTEGER NOT NULL,
                view2s_rate REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS error_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                at INTEGER NOT NULL,
                kind TEXT NOT NULL,
                message TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_error_log_at ON error_log(at);
            "#,
        )
        .map_err(|e| PlannerError::Storage(format!("Failed to initialize schema: {e}")))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| PlannerError::Storage("Store lock poisoned".to_string()))
    }

    /// Base directory for this store.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn put_catalog_row<T: Serialize>(&self, table: &str, id: &str, entity: &T) -> Result<()> {
        let json = serde_json::to_string(entity)?;
        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT OR REPLACE INTO {table} (id, json_data) VALUES (?1, ?2)"),
            params![id, json],
        )?;
        Ok(())
    }

    fn list_catalog_rows<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT json_data FROM {table} ORDER BY id"))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut entities = Vec::new();
        for row in rows {
            entities.push(serde_json::from_str(&row?)?);
        }
        Ok(entities)
    }

    fn collect_plans(stmt: &mut rusqlite::Statement<'_>, args: impl rusqlite::Params) -> Result<Vec<Plan>> {
        let rows = stmt.query_map(args, |row| row.get::<_, String>(0))?;
        let mut plans = Vec::new();
        for row in rows {
            plans.push(serde_json::from_str(&row?)?);
        }
        Ok(plans)
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn clips(&self) -> Result<Vec<Clip>> {
        self.list_catalog_rows("clips")
    }

    async fn snippets(&self) -> Result<Vec<Snippet>> {
        self.list_catalog_rows("snippets")
    }

    async fn tracks(&self) -> Result<Vec<Track>> {
        self.list_catalog_rows("tracks")
    }

    async fn recipes(&self) -> Result<Vec<Recipe>> {
        self.list_catalog_rows("recipes")
    }

    async fn ctas(&self) -> Result<Vec<Cta>> {
        self.list_catalog_rows("ctas")
    }

    async fn put_clip(&self, clip: &Clip) -> Result<()> {
        self.put_catalog_row("clips", &clip.id, clip)
    }

    async fn put_snippet(&self, snippet: &Snippet) -> Result<()> {
        self.put_catalog_row("snippets", &snippet.id, snippet)
    }

    async fn put_track(&self, track: &Track) -> Result<()> {
        self.put_catalog_row("tracks", &track.id, track)
    }

    async fn put_recipe(&self, recipe: &Recipe) -> Result<()> {
        self.put_catalog_row("recipes", &recipe.id, recipe)
    }

    async fn put_cta(&self, cta: &Cta) -> Result<()> {
        self.put_catalog_row("ctas", &cta.id, cta)
    }
}

#[async_trait]
impl PlanStore for SqliteStore {
    async fn create_plan(&self, plan: &Plan) -> Result<()> {
        let json = serde_json::to_string(plan)?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO plans
            (id, scheduled_at, container, recipe_id, track_id, snippet_id, status, created_at, json_data)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                plan.id,
                plan.scheduled_at.timestamp_millis(),
                plan.container.as_str(),
                plan.recipe_id,
                plan.track_id,
                plan.snippet_id,
                plan.status.as_str(),
                plan.created_at,
                json,
            ],
        )?;
        Ok(())
    }

    async fn plan(&self, id: &str) -> Result<Option<Plan>> {
        let conn = self.conn()?;
        let result = conn.query_row("SELECT json_data FROM plans WHERE id = ?1", [id], |row| {
            row.get::<_, String>(0)
        });

        match result {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn plans_since(&self, since: DateTime<Utc>) -> Result<Vec<Plan>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT json_data FROM plans WHERE scheduled_at >= ?1 ORDER BY scheduled_at DESC")?;
        Self::collect_plans(&mut stmt, params![since.timestamp_millis()])
    }

    async fn recent_plans(&self, limit: usize) -> Result<Vec<Plan>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT json_data FROM plans ORDER BY created_at DESC LIMIT ?1")?;
        Self::collect_plans(&mut stmt, params![limit as i64])
    }

    async fn set_plan_status(&self, id: &str, status: PlanStatus) -> Result<()> {
        let mut plan = self
            .plan(id)
            .await?
            .ok_or_else(|| PlannerError::PlanNotFound(id.to_string()))?;
        plan.status = status;
        self.create_plan(&plan).await
    }
}

#[async_trait]
impl StatsStore for SqliteStore {
    async fn stats_book(&self) -> Result<StatsBook> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT json_data FROM arm_stats")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut stats = Vec::new();
        for row in rows {
            stats.push(serde_json::from_str(&row?)?);
        }
        Ok(StatsBook::from_stats(stats))
    }

    async fn upsert_arm(&self, stats: &ArmStats) -> Result<()> {
        let json = serde_json::to_string(stats)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO arm_stats (arm_type, arm_id, json_data) VALUES (?1, ?2, ?3)",
            params![stats.arm_type.as_str(), stats.arm_id, json],
        )?;
        Ok(())
    }
}

#[async_trait]
impl MetricsStore for SqliteStore {
    async fn upsert_day_metrics(&self, metrics: &DayMetrics) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO day_metrics (day, views, view2s_rate) VALUES (?1, ?2, ?3)",
            params![metrics.day, metrics.views as i64, metrics.view2s_rate],
        )?;
        Ok(())
    }

    async fn recent_day_metrics(&self, days: usize) -> Result<Vec<DayMetrics>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT day, views, view2s_rate FROM day_metrics ORDER BY day DESC LIMIT ?1")?;
        let rows = stmt.query_map(params![days as i64], |row| {
            Ok(DayMetrics {
                day: row.get(0)?,
                views: row.get::<_, i64>(1)? as u64,
                view2s_rate: row.get(2)?,
            })
        })?;

        let mut metrics = Vec::new();
        for row in rows {
            metrics.push(row?);
        }
        Ok(metrics)
    }

    async fn record_error(&self, kind: &str, message: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO error_log (at, kind, message) VALUES (?1, ?2, ?3)",
            params![now_ms(), kind, message],
        )?;
        Ok(())
    }

    async fn error_count_since(&self, since: DateTime<Utc>) -> Result<u32> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM error_log WHERE at >= ?1",
            params![since.timestamp_millis()],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }
}

/// Hash an account name for storage isolation.
pub fn compute_account_hash(account: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(account.as_bytes());
    let result = hasher.finalize();

    // First 16 hex chars are plenty
    hex::encode(&result[..8])
}

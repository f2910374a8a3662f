//! Persistence layer.
//!
//! Everything is SQLite behind async trait seams: catalog entities, plan
//! history, bandit arm statistics, daily metrics, and the spam/error log.
//! Entities live as JSON blobs next to the columns queries filter on.
//!
//! # Example
//!
//! ```ignore
//! use reelplan::store::{PlanStore, SqliteStore};
//!
//! let store = SqliteStore::open("mybeats", None)?;
//! let queue = store.recent_plans(10).await?;
//! ```

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, compute_account_hash};
pub use traits::{CatalogStore, MetricsStore, PipelineStore, PlanStore, StatsStore};

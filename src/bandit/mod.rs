//! Online learning over plan dimensions.
//!
//! Every choosable dimension of a plan (container, recipe, CTA, clip,
//! snippet strategy) is an arm with cumulative reward statistics. Selection
//! is UCB1 over prior-shrunk means, with forced exploration while arms are
//! under-sampled and an optional locked-arm override for editorially pinned
//! recipes and CTAs.
//!
//! # Example
//!
//! ```ignore
//! use reelplan::bandit::{ArmType, SelectParams, StatsBook, select};
//!
//! let book = StatsBook::new();
//! let candidates = vec!["r1".to_string(), "r2".to_string()];
//! let pick = select(&book, ArmType::Recipe, &candidates, &params, None, &mut rng);
//! ```

mod selector;
mod stats;

pub use selector::{LockableCandidate, PriorBoost, SelectParams, Selection, select, select_lockable};
pub use stats::{ArmStats, ArmType, StatsBook};

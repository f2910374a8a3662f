//! Reelplan - a scheduling engine for short-form video post plans
//!
//! Reelplan picks a container format, clip set, music snippet, and hook
//! recipe for each slot, learning from reward feedback while a layer of
//! time-windowed cooldowns keeps posts from repeating themselves.

pub mod bandit;
pub mod config;
pub mod cooldown;
pub mod domain;
pub mod error;
pub mod id;
pub mod planner;
pub mod recovery;
pub mod store;

pub use error::{PlannerError, Result};

//! Domain types for reelplan
//!
//! This module contains all core domain types:
//! - Plan: one scheduled unit of content with its selection metadata
//! - Clip/Snippet/Track: the read-only media catalog
//! - Recipe/Cta: hook templates and calls-to-action
//! - DayMetrics: per-day performance aggregates for the recovery monitor
//!
//! Catalog types are read-only to the planner; Plans are created on commit
//! and never mutated by the planner afterward.

pub mod content;
pub mod metrics;
pub mod plan;
pub mod recipe;

pub use content::{Clip, ClipCategory, Moment, Snippet, SyncRisk, Track, section_moment};
pub use metrics::DayMetrics;
pub use plan::{Container, Plan, PlanDraft, PlanExperiment, PlanStatus, SelectionMode};
pub use recipe::{Cta, CtaIntent, CtaKind, Recipe};

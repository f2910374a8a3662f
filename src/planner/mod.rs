//! The planning engine.
//!
//! This module owns the per-slot state machine and the pieces it runs:
//! - **assembler**: the batch loop and slot stages, ending in a committed Plan
//! - **clipset**: clip sequence assembly and duration expansion
//! - **recipes**: cooldown filtering with cascading relaxation tiers
//! - **compat**: clip-set / snippet compatibility scoring
//! - **text**: normalization, phrase heuristics, caption assembly
//!
//! # Example
//!
//! ```ignore
//! use reelplan::planner::PlanAssembler;
//!
//! let assembler = PlanAssembler::new(store, config.rules.clone());
//! let outcome = assembler.build_plans(4, None).await?;
//! println!("created {} plans", outcome.created_ids.len());
//! ```

mod assembler;
mod clipset;
mod compat;
mod recipes;
pub mod text;

pub use assembler::{BatchOutcome, PlanAssembler, SlotOutcome, SlotStage, SnippetStrategy};
pub use clipset::{ClipSet, assemble, expand_for_duration};
pub use compat::{CompatReport, score};
pub use recipes::{FilterOutcome, filter};

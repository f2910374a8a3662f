//! Time-windowed anti-repetition state.
//!
//! A `CooldownState` is a per-batch snapshot of what was used recently:
//! recipe/snippet/track/clip ids, exact and prefix text, hook-family and
//! phrase counters, and the rolling CTA-intent history. The tracker builds
//! it once from plan history; the assembler mutates it as slots commit so
//! slot *i+1* sees slot *i*'s choices.

mod state;
mod tracker;

pub use state::CooldownState;
pub use tracker::CooldownTracker;

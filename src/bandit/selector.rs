//! UCB1 selection over prior-shrunk means.
//!
//! Selection is a pure function of the stats book, the candidate list, the
//! params, and an injected RNG, so batches replay deterministically under a
//! fixed seed.

use rand::Rng;
use rand::rngs::StdRng;
use std::collections::HashMap;

use crate::bandit::stats::{ArmType, StatsBook};
use crate::config::BanditConfig;
use crate::domain::SelectionMode;

/// Tunables for one selection call.
#[derive(Debug, Clone, Copy)]
pub struct SelectParams {
    /// Probability of a uniform exploration pick.
    pub exploration_budget: f64,
    /// Prior mean reward for shrinkage.
    pub prior_mean: f64,
    /// Prior pseudo-count weight.
    pub prior_weight: f64,
    /// Exploit only once some candidate has this many pulls.
    pub min_pulls_before_exploit: u64,
}

impl From<&BanditConfig> for SelectParams {
    fn from(config: &BanditConfig) -> Self {
        Self {
            exploration_budget: config.exploration_budget,
            prior_mean: config.prior_mean,
            prior_weight: config.prior_weight,
            min_pulls_before_exploit: config.min_pulls_before_exploit,
        }
    }
}

/// One arm pick and how it was made.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub arm_id: String,
    pub mode: SelectionMode,
}

/// Extra prior weight for an arm, active while its pulls stay below
/// `until_pulls`. Used to warm-start newly promoted recipes.
#[derive(Debug, Clone, Copy)]
pub struct PriorBoost {
    pub amount: f64,
    pub until_pulls: u64,
}

/// A candidate for lockable selection.
#[derive(Debug, Clone)]
pub struct LockableCandidate {
    pub arm_id: String,
    pub locked: bool,
}

impl LockableCandidate {
    pub fn new(arm_id: impl Into<String>, locked: bool) -> Self {
        Self {
            arm_id: arm_id.into(),
            locked,
        }
    }
}

/// Select one arm among `candidates`.
///
/// Order of precedence:
/// 1. Any zero-pull candidate: uniform among those, mode `Unpulled`.
/// 2. Exploration coin, or every candidate still under the pull floor:
///    uniform among all, mode `Explore`.
/// 3. UCB1 argmax over prior-shrunk means, mode `Exploit`. Ties keep the
///    first candidate in list order.
///
/// Returns `None` when `candidates` is empty.
pub fn select(
    book: &StatsBook,
    arm_type: ArmType,
    candidates: &[String],
    params: &SelectParams,
    boosts: Option<&HashMap<String, PriorBoost>>,
    rng: &mut StdRng,
) -> Option<Selection> {
    if candidates.is_empty() {
        return None;
    }

    // Zero-pull arms always go first
    let unpulled: Vec<&String> = candidates.iter().filter(|id| book.pulls(arm_type, id) == 0).collect();
    if !unpulled.is_empty() {
        let pick = unpulled[rng.random_range(0..unpulled.len())];
        return Some(Selection {
            arm_id: pick.clone(),
            mode: SelectionMode::Unpulled,
        });
    }

    let max_pulls = candidates.iter().map(|id| book.pulls(arm_type, id)).max().unwrap_or(0);
    let explore_coin = rng.random_bool(params.exploration_budget.clamp(0.0, 1.0));
    if explore_coin || max_pulls < params.min_pulls_before_exploit {
        let pick = &candidates[rng.random_range(0..candidates.len())];
        return Some(Selection {
            arm_id: pick.clone(),
            mode: SelectionMode::Explore,
        });
    }

    let total_pulls: u64 = candidates.iter().map(|id| book.pulls(arm_type, id)).sum();
    let ln_total = (total_pulls.max(1) as f64).ln();

    let mut best_idx = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, id) in candidates.iter().enumerate() {
        let pulls = book.pulls(arm_type, id);
        let boost = boost_for(boosts, id, pulls);
        let effective_prior = params.prior_weight + boost;
        let mean = book
            .get(arm_type, id)
            .map(|s| s.shrunk_mean(params.prior_mean, effective_prior))
            .unwrap_or(params.prior_mean);
        let bonus = (2.0 * ln_total / pulls.max(1) as f64).sqrt();
        let score = mean + bonus;
        if score > best_score {
            best_idx = i;
            best_score = score;
        }
    }

    Some(Selection {
        arm_id: candidates[best_idx].clone(),
        mode: SelectionMode::Exploit,
    })
}

/// Select among candidates where some may be editorially locked.
///
/// Locked arms bypass the bandit: if everything is locked the pick is always
/// a locked arm; otherwise locked arms win a `max_locked_share` coin and the
/// bandit runs over the unlocked subset the rest of the time. Applies to
/// recipes and CTAs only.
pub fn select_lockable(
    book: &StatsBook,
    arm_type: ArmType,
    candidates: &[LockableCandidate],
    params: &SelectParams,
    max_locked_share: f64,
    boosts: Option<&HashMap<String, PriorBoost>>,
    rng: &mut StdRng,
) -> Option<Selection> {
    if candidates.is_empty() {
        return None;
    }

    let locked: Vec<&LockableCandidate> = candidates.iter().filter(|c| c.locked).collect();
    let unlocked: Vec<String> = candidates
        .iter()
        .filter(|c| !c.locked)
        .map(|c| c.arm_id.clone())
        .collect();

    if unlocked.is_empty() {
        let pick = locked[rng.random_range(0..locked.len())];
        return Some(Selection {
            arm_id: pick.arm_id.clone(),
            mode: SelectionMode::Locked,
        });
    }

    if !locked.is_empty() && rng.random_bool(max_locked_share.clamp(0.0, 1.0)) {
        let pick = locked[rng.random_range(0..locked.len())];
        tracing::debug!(arm_type = %arm_type, arm = %pick.arm_id, "Locked arm served ahead of bandit");
        return Some(Selection {
            arm_id: pick.arm_id.clone(),
            mode: SelectionMode::Locked,
        });
    }

    select(book, arm_type, &unlocked, params, boosts, rng)
}

fn boost_for(boosts: Option<&HashMap<String, PriorBoost>>, arm_id: &str, pulls: u64) -> f64 {
    boosts
        .and_then(|map| map.get(arm_id))
        .filter(|b| pulls < b.until_pulls)
        .map(|b| b.amount)
        .unwrap_or(0.0)
}

//! Clip sequence assembly and duration expansion.

use rand::Rng;
use rand::rngs::StdRng;
use std::collections::HashMap;

use crate::bandit::{ArmType, SelectParams, StatsBook, select};
use crate::config::RuleConfig;
use crate::domain::{Clip, ClipCategory, Container, SelectionMode, Snippet, SyncRisk};

/// An ordered clip sequence for one slot, before text assembly.
#[derive(Debug, Clone)]
pub struct ClipSet {
    /// Effective container after any downgrade
    pub container: Container,
    pub clip_ids: Vec<String>,
    /// Mode of the first clip pick; None when no anchor candidate existed
    pub anchor_mode: Option<SelectionMode>,
    /// Set when a montage was downgraded to static
    pub container_relaxed: bool,
}

/// Assemble a clip set for `container` from the eligible pool.
///
/// A montage downgrades to a static post when the pool is too small and
/// static is allowed; otherwise the slot is skipped with the returned
/// reason.
pub fn assemble(
    container: Container,
    pool: &[Clip],
    rules: &RuleConfig,
    book: &StatsBook,
    rng: &mut StdRng,
) -> Result<ClipSet, String> {
    match container {
        Container::Montage => assemble_montage(pool, rules, book, rng),
        Container::Static => assemble_static(pool, rules, book, rng, false),
    }
}

fn assemble_montage(
    pool: &[Clip],
    rules: &RuleConfig,
    book: &StatsBook,
    rng: &mut StdRng,
) -> Result<ClipSet, String> {
    let cs = &rules.clipset;
    if pool.len() < cs.montage_min_clips {
        if rules.allows_container(Container::Static) {
            tracing::debug!(
                pool = pool.len(),
                min = cs.montage_min_clips,
                "Montage pool too small, downgrading to static"
            );
            return assemble_static(pool, rules, book, rng, true);
        }
        return Err("Not enough eligible clips for montage.".to_string());
    }

    let params = SelectParams::from(&rules.bandit);
    let mut clip_ids = Vec::new();
    let mut remaining: Vec<&Clip> = pool.iter().collect();

    // The anchor comes first so every montage opens on a recognizable
    // screen-capture shot when one is available
    let anchors: Vec<String> = remaining
        .iter()
        .filter(|c| c.category == ClipCategory::DawCapture)
        .map(|c| c.id.clone())
        .collect();
    let anchor_mode = match select(book, ArmType::Clip, &anchors, &params, None, rng) {
        Some(pick) => {
            remaining.retain(|c| c.id != pick.arm_id);
            clip_ids.push(pick.arm_id);
            Some(pick.mode)
        }
        None => None,
    };

    while clip_ids.len() < cs.montage_max_clips && !remaining.is_empty() {
        let candidates: Vec<String> = remaining.iter().map(|c| c.id.clone()).collect();
        let Some(pick) = select(book, ArmType::Clip, &candidates, &params, None, rng) else {
            break;
        };
        remaining.retain(|c| c.id != pick.arm_id);
        clip_ids.push(pick.arm_id);
    }

    Ok(ClipSet {
        container: Container::Montage,
        clip_ids,
        anchor_mode,
        container_relaxed: false,
    })
}

fn assemble_static(
    pool: &[Clip],
    rules: &RuleConfig,
    book: &StatsBook,
    rng: &mut StdRng,
    container_relaxed: bool,
) -> Result<ClipSet, String> {
    let safe: Vec<String> = pool
        .iter()
        .filter(|c| c.sync_risk == SyncRisk::Safe)
        .map(|c| c.id.clone())
        .collect();
    let candidates = if safe.is_empty() {
        pool.iter().map(|c| c.id.clone()).collect()
    } else {
        safe
    };

    let params = SelectParams::from(&rules.bandit);
    let pick = select(book, ArmType::Clip, &candidates, &params, None, rng)
        .ok_or_else(|| "No eligible clips available.".to_string())?;

    Ok(ClipSet {
        container: Container::Static,
        clip_ids: vec![pick.arm_id],
        anchor_mode: Some(pick.mode),
        container_relaxed,
    })
}

/// Append clips until usable duration covers the snippet.
///
/// Usable duration is the clamped per-clip range for a montage and the
/// raw clip duration for a static post. Returns a warning when the clip
/// cap is hit before the snippet is covered; an exhausted pool ends the
/// pass silently.
pub fn expand_for_duration(
    set: &mut ClipSet,
    pool: &[Clip],
    snippet: &Snippet,
    rules: &RuleConfig,
    rng: &mut StdRng,
) -> Option<String> {
    let cs = &rules.clipset;
    let cap = match set.container {
        Container::Montage => cs.montage_max_clips,
        Container::Static => cs.static_max_clips,
    };
    let usable = |clip: &Clip| match set.container {
        Container::Montage => clip.duration_secs.clamp(cs.montage_clip_min_secs, cs.montage_clip_max_secs),
        Container::Static => clip.duration_secs,
    };

    let by_id: HashMap<&str, &Clip> = pool.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut total: f64 = set
        .clip_ids
        .iter()
        .filter_map(|id| by_id.get(id.as_str()))
        .map(|c| usable(c))
        .sum();
    let mut remaining: Vec<&Clip> = pool.iter().filter(|c| !set.clip_ids.contains(&c.id)).collect();

    while total < snippet.duration {
        if set.clip_ids.len() >= cap {
            tracing::debug!(
                container = set.container.as_str(),
                clips = set.clip_ids.len(),
                covered = total,
                target = snippet.duration,
                "Clip cap hit before covering snippet"
            );
            return Some(match set.container {
                Container::Montage => "Montage clip cap reached before covering snippet.".to_string(),
                Container::Static => "Static clip cap reached before covering snippet.".to_string(),
            });
        }
        if remaining.is_empty() {
            break;
        }
        let clip = remaining.swap_remove(rng.random_range(0..remaining.len()));
        total += usable(clip);
        set.clip_ids.push(clip.id.clone());
    }

    None
}

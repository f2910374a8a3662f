//! Clip-set / snippet compatibility scoring.

use crate::config::RuleConfig;
use crate::domain::{Clip, Snippet, SyncRisk};

const BASE_SCORE: f64 = 0.75;
const MOMENT_MATCH_BONUS: f64 = 0.12;
const MOMENT_MISMATCH_PENALTY: f64 = 0.08;

/// Scoring result for one clip set against one snippet.
#[derive(Debug, Clone)]
pub struct CompatReport {
    /// Weakest-link score in [0, 1]
    pub score: f64,
    /// Human-readable notes, carried onto the committed plan
    pub reasons: Vec<String>,
    /// Critical sync risk anywhere in the set
    pub blocked: bool,
}

/// Score a clip set against a snippet.
///
/// Any critical-sync clip blocks the whole set outright. Otherwise each
/// clip starts at 0.75, moves with moment match/mismatch when both sides
/// are meaningful, loses the sensitive penalty, and clamps to [0, 1]. The
/// set scores at its worst clip, not the average.
pub fn score(clips: &[&Clip], snippet: &Snippet, rules: &RuleConfig) -> CompatReport {
    if clips.is_empty() {
        return CompatReport {
            score: 0.0,
            reasons: vec!["Empty clip set.".to_string()],
            blocked: false,
        };
    }

    let snippet_moment = snippet.moment();
    let mut reasons = Vec::new();
    let mut min_score = f64::MAX;
    let mut any_sensitive = false;

    for clip in clips {
        if clip.sync_risk == SyncRisk::Critical {
            return CompatReport {
                score: 0.0,
                reasons: vec![format!("Clip {} has critical sync risk.", clip.id)],
                blocked: true,
            };
        }

        let mut clip_score = BASE_SCORE;
        if clip.moment.is_meaningful() && snippet_moment.is_meaningful() {
            if clip.moment == snippet_moment {
                clip_score += MOMENT_MATCH_BONUS;
                reasons.push(format!("Clip {} matches the {} moment.", clip.id, snippet_moment));
            } else {
                clip_score -= MOMENT_MISMATCH_PENALTY;
                reasons.push(format!(
                    "Clip {} is {} against a {} snippet.",
                    clip.id, clip.moment, snippet_moment
                ));
            }
        }
        if clip.sync_risk == SyncRisk::Sensitive {
            clip_score -= rules.compat.sensitive_sync_penalty;
            any_sensitive = true;
        }

        min_score = min_score.min(clip_score.clamp(0.0, 1.0));
    }

    if any_sensitive {
        reasons.push("Set contains sensitive-sync footage.".to_string());
    }

    CompatReport {
        score: min_score,
        reasons,
        blocked: false,
    }
}

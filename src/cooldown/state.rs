//! The per-batch cooldown snapshot.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::RuleConfig;
use crate::domain::{Container, CtaIntent, CtaKind, Plan};
use crate::planner::text;

/// Everything used recently, bucketed by the window that applies to it.
///
/// In-memory only. Rebuilt from history at batch start and mutated in place
/// on each commit; never persisted.
#[derive(Debug, Clone, Default)]
pub struct CooldownState {
    /// Recipe ids inside the strict reuse window
    pub recipes_strict: HashSet<String>,
    /// Recipe ids inside the shorter relaxed reuse window
    pub recipes_relaxed: HashSet<String>,
    /// Snippet ids inside their hour window
    pub snippets: HashSet<String>,
    /// Track ids inside their hour window
    pub tracks: HashSet<String>,
    /// Clip ids inside their hour window
    pub clips: HashSet<String>,
    /// Ordered montage clip-id signatures inside their hour window
    pub montage_signatures: HashSet<String>,
    /// Normalized beat-1 lines inside the exact window
    pub beat1_exact: HashSet<String>,
    /// Beat-1 opening-words prefixes inside the prefix window
    pub beat1_prefixes: HashSet<String>,
    /// Normalized beat-2 lines inside the exact window
    pub beat2_exact: HashSet<String>,
    /// Normalized, hashtag-stripped captions inside the exact window
    pub captions_exact: HashSet<String>,
    /// Plans per hook family today
    pub hook_family_day: HashMap<String, u32>,
    /// Plans per hook family this week
    pub hook_family_week: HashMap<String, u32>,
    /// Plans this week whose text tripped the anti-algorithm phrase list
    pub anti_algorithm_week: u32,
    /// Comment-kind CTAs today
    pub comment_ctas_today: u32,
    /// Recent CTA intents, most recent first, capped
    pub cta_intents: VecDeque<CtaIntent>,
    /// Plans per snippet section label today
    pub section_styles_today: HashMap<String, u32>,
}

impl CooldownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Day and week counts for a hook family.
    pub fn hook_family_counts(&self, family: &str) -> (u32, u32) {
        (
            self.hook_family_day.get(family).copied().unwrap_or(0),
            self.hook_family_week.get(family).copied().unwrap_or(0),
        )
    }

    /// The intent at the front of the rolling history and how many
    /// consecutive plans share it.
    pub fn leading_intent_streak(&self) -> Option<(CtaIntent, usize)> {
        let first = *self.cta_intents.front()?;
        let run = self.cta_intents.iter().take_while(|i| **i == first).count();
        Some((first, run))
    }

    /// How many plans today used the given snippet section label.
    pub fn section_style_count(&self, section: &str) -> u32 {
        self.section_styles_today.get(section).copied().unwrap_or(0)
    }

    /// Fold a freshly committed plan into the snapshot so the next slot
    /// sees it as recent. A field only registers when its window is
    /// non-zero.
    pub fn record_commit(&mut self, plan: &Plan, cta_kind: Option<CtaKind>, section: &str, rules: &RuleConfig) {
        let cd = &rules.cooldowns;

        if cd.recipe_days > 0 {
            self.recipes_strict.insert(plan.recipe_id.clone());
        }
        if cd.recipe_days_relaxed > 0 {
            self.recipes_relaxed.insert(plan.recipe_id.clone());
        }
        if cd.beat1_exact_days > 0 {
            self.beat1_exact.insert(text::normalize_exact(&plan.line1));
        }
        if cd.beat1_prefix_days > 0 {
            self.beat1_prefixes
                .insert(text::word_prefix(&plan.line1, cd.beat1_prefix_words));
        }
        if cd.beat2_exact_days > 0 {
            self.beat2_exact.insert(text::normalize_exact(&plan.line2));
        }
        if cd.caption_exact_days > 0 {
            self.captions_exact.insert(text::normalize_caption(&plan.caption));
        }
        if cd.snippet_hours > 0 {
            self.snippets.insert(plan.snippet_id.clone());
        }
        if cd.track_hours > 0 {
            self.tracks.insert(plan.track_id.clone());
        }
        if cd.clip_hours > 0 {
            for id in &plan.clip_ids {
                self.clips.insert(id.clone());
            }
        }
        if plan.container == Container::Montage && cd.montage_signature_hours > 0 {
            self.montage_signatures.insert(plan.clip_signature());
        }

        if !plan.hook_family.is_empty() {
            *self.hook_family_day.entry(plan.hook_family.clone()).or_insert(0) += 1;
            *self.hook_family_week.entry(plan.hook_family.clone()).or_insert(0) += 1;
        }

        let combined = format!("{} {} {}", plan.line1, plan.line2, plan.caption);
        if text::matches_anti_algorithm(&combined) {
            self.anti_algorithm_week += 1;
        }

        if cta_kind == Some(CtaKind::Comment) {
            self.comment_ctas_today += 1;
        }
        if let Some(kind) = cta_kind {
            self.cta_intents.push_front(kind.intent());
            self.cta_intents.truncate(cd.cta_intent_history_len);
        }

        if !section.is_empty() {
            *self.section_styles_today.entry(section.to_string()).or_insert(0) += 1;
        }
    }
}

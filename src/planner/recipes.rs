//! Recipe pool filtering with cascading relaxation tiers.
//!
//! One predicate covers every guardrail; tiers switch individual checks
//! off in a fixed order and the cascade stops at the first tier that
//! leaves any recipe standing.

use crate::config::RuleConfig;
use crate::cooldown::CooldownState;
use crate::domain::{CtaKind, Recipe};
use crate::planner::text;

/// Which checks one tier applies.
#[derive(Debug, Clone, Copy)]
struct FilterTier {
    name: &'static str,
    relaxed_recipe_window: bool,
    check_prefix: bool,
    check_anti_algorithm: bool,
    check_cta_streak: bool,
    warning: Option<&'static str>,
}

/// Tried in order; the first non-empty tier wins.
const TIERS: &[FilterTier] = &[
    FilterTier {
        name: "strict",
        relaxed_recipe_window: false,
        check_prefix: true,
        check_anti_algorithm: true,
        check_cta_streak: true,
        warning: None,
    },
    FilterTier {
        name: "relaxed-prefix",
        relaxed_recipe_window: true,
        check_prefix: false,
        check_anti_algorithm: true,
        check_cta_streak: true,
        warning: Some("Recipe cooldowns relaxed: repeated openers allowed."),
    },
    FilterTier {
        name: "relaxed-anti-algo",
        relaxed_recipe_window: true,
        check_prefix: false,
        check_anti_algorithm: false,
        check_cta_streak: true,
        warning: Some("Recipe cooldowns relaxed: anti-algorithm cap lifted."),
    },
    FilterTier {
        name: "relaxed-cta-streak",
        relaxed_recipe_window: true,
        check_prefix: false,
        check_anti_algorithm: false,
        check_cta_streak: false,
        warning: Some("Recipe cooldowns relaxed: CTA intent streak cap lifted."),
    },
];

/// Outcome of the cascade.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Recipes that survived the winning tier; empty when every tier
    /// came up empty
    pub recipes: Vec<Recipe>,
    /// Name of the winning tier, None when the cascade was exhausted
    pub tier: Option<&'static str>,
    /// One warning per relaxation in effect at the winning tier
    pub warnings: Vec<String>,
}

impl FilterOutcome {
    /// Whether any relaxation was needed.
    pub fn relaxed(&self) -> bool {
        self.tier.is_some_and(|t| t != "strict")
    }
}

/// Run the relaxation cascade over the recipe pool.
pub fn filter(rules: &RuleConfig, recipes: &[Recipe], state: &CooldownState) -> FilterOutcome {
    for (i, tier) in TIERS.iter().enumerate() {
        let surviving: Vec<Recipe> = recipes
            .iter()
            .filter(|r| passes(r, tier, rules, state))
            .cloned()
            .collect();
        if !surviving.is_empty() {
            let warnings: Vec<String> = TIERS[..=i]
                .iter()
                .filter_map(|t| t.warning.map(String::from))
                .collect();
            if tier.name != "strict" {
                tracing::debug!(tier = tier.name, recipes = surviving.len(), "Recipe filter relaxed");
            }
            return FilterOutcome {
                recipes: surviving,
                tier: Some(tier.name),
                warnings,
            };
        }
    }

    FilterOutcome {
        recipes: Vec::new(),
        tier: None,
        warnings: Vec::new(),
    }
}

fn passes(recipe: &Recipe, tier: &FilterTier, rules: &RuleConfig, state: &CooldownState) -> bool {
    if !recipe.enabled {
        return false;
    }

    let cd = &rules.cooldowns;

    let recipe_set = if tier.relaxed_recipe_window {
        &state.recipes_relaxed
    } else {
        &state.recipes_strict
    };
    if recipe_set.contains(&recipe.id) {
        return false;
    }

    if let Some(kind) = recipe.cta_kind
        && !rules.allows_cta_kind(kind)
    {
        return false;
    }
    if recipe.cta_kind == Some(CtaKind::Comment) && state.comment_ctas_today >= cd.max_comment_ctas_per_day {
        return false;
    }

    if state.beat1_exact.contains(&text::normalize_exact(&recipe.beat1)) {
        return false;
    }
    if state.beat2_exact.contains(&text::normalize_exact(&recipe.beat2)) {
        return false;
    }
    if tier.check_prefix
        && state
            .beat1_prefixes
            .contains(&text::word_prefix(&recipe.beat1, cd.beat1_prefix_words))
    {
        return false;
    }

    if recipe.caption_template.trim().is_empty() {
        return false;
    }
    if state
        .captions_exact
        .contains(&text::normalize_caption(&recipe.caption_template))
    {
        return false;
    }

    if let Some(family) = &recipe.hook_family {
        let (day, week) = state.hook_family_counts(family);
        if day >= cd.hook_family_per_day || week >= cd.hook_family_per_week {
            return false;
        }
    }

    if tier.check_anti_algorithm && state.anti_algorithm_week >= cd.anti_algorithm_per_week {
        let combined = format!("{} {} {}", recipe.beat1, recipe.beat2, recipe.caption_template);
        if text::matches_anti_algorithm(&combined) {
            return false;
        }
    }

    if tier.check_cta_streak
        && let Some(intent) = recipe.cta_intent()
        && let Some((leading, run)) = state.leading_intent_streak()
        && leading == intent
        && run >= cd.max_same_cta_intent_in_row
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cooldown::CooldownTracker;
    use crate::domain::{Container, CtaIntent, Plan, PlanExperiment, PlanStatus, SelectionMode};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn recipe(id: &str, beat1: &str) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: id.to_string(),
            beat1: beat1.to_string(),
            beat2: format!("payoff for {id}"),
            caption_template: format!("caption for {id} with {{track}}"),
            cta_kind: Some(CtaKind::Comment),
            allowed_moments: vec![],
            disallowed_containers: vec![],
            hook_family: Some(format!("family-{id}")),
            enabled: true,
            locked: false,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
    }

    fn plan_with_line1(days_ago: i64, line1: &str) -> Plan {
        Plan {
            id: format!("plan-{days_ago}"),
            scheduled_at: now() - Duration::days(days_ago),
            container: Container::Static,
            clip_ids: vec!["c1".into()],
            track_id: "t1".into(),
            snippet_id: "sn1".into(),
            snippet_start: 0.0,
            snippet_duration: 8.0,
            line1: line1.to_string(),
            line2: "some other payoff".to_string(),
            caption: "a different caption".to_string(),
            recipe_id: "unrelated-recipe".to_string(),
            hook_family: String::new(),
            compat_score: 0.8,
            reasons: vec![],
            status: PlanStatus::Posted,
            experiment: PlanExperiment {
                container: SelectionMode::Explore,
                recipe: SelectionMode::Explore,
                cta: None,
                snippet_strategy: SelectionMode::Explore,
                anchor_clip: None,
            },
            created_at: 0,
        }
    }

    #[test]
    fn test_beat1_cooldown_excludes_then_releases() {
        let rules = RuleConfig::default();
        let r = recipe("r1", "wait for the drop tonight friends");

        // Same beat-1 posted 2 days ago: inside the 14-day window
        let history = vec![plan_with_line1(2, "wait for the drop tonight friends")];
        let state = CooldownTracker::build(&rules, &history, &[], &[], now());
        let outcome = filter(&rules, &[r.clone()], &state);
        assert!(outcome.recipes.is_empty());
        assert!(outcome.tier.is_none());

        // 15 days later the window has passed
        let history = vec![plan_with_line1(15, "wait for the drop tonight friends")];
        let state = CooldownTracker::build(&rules, &history, &[], &[], now());
        let outcome = filter(&rules, &[r], &state);
        assert_eq!(outcome.recipes.len(), 1);
        assert_eq!(outcome.tier, Some("strict"));
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_prefix_blocker_falls_to_relaxed_tier() {
        let rules = RuleConfig::default();
        // Shares the first four words with a 2-day-old plan but not the
        // full line, so only the prefix check blocks at the strict tier
        let r = recipe("r1", "wait for the drop in this one");
        let history = vec![plan_with_line1(2, "wait for the drop and stay")];
        let state = CooldownTracker::build(&rules, &history, &[], &[], now());

        let outcome = filter(&rules, &[r], &state);
        assert_eq!(outcome.recipes.len(), 1);
        assert_eq!(outcome.tier, Some("relaxed-prefix"));
        assert!(outcome.relaxed());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("repeated openers"));
    }

    #[test]
    fn test_comment_cap_blocks_comment_recipes_only() {
        let rules = RuleConfig::default();
        let mut state = CooldownState::new();
        state.comment_ctas_today = rules.cooldowns.max_comment_ctas_per_day;

        let comment = recipe("ask-comment", "drop a take below");
        let mut follow = recipe("ask-follow", "come along for part two");
        follow.cta_kind = Some(CtaKind::Follow);

        let outcome = filter(&rules, &[comment, follow], &state);
        assert_eq!(outcome.recipes.len(), 1);
        assert_eq!(outcome.recipes[0].id, "ask-follow");
        assert_eq!(outcome.tier, Some("strict"));
    }

    #[test]
    fn test_disallowed_cta_kind_blocks_recipe() {
        let mut rules = RuleConfig::default();
        rules.allowed_cta_kinds = vec![CtaKind::Follow];
        let state = CooldownState::new();

        let outcome = filter(&rules, &[recipe("r1", "unique opener one here")], &state);
        assert!(outcome.recipes.is_empty());
    }

    #[test]
    fn test_recipe_window_strict_vs_relaxed_sets() {
        let rules = RuleConfig::default();
        let mut state = CooldownState::new();
        // Used 5 days ago: inside strict (7d), outside relaxed (3d)
        state.recipes_strict.insert("r1".to_string());

        let outcome = filter(&rules, &[recipe("r1", "another unique opener line")], &state);
        assert_eq!(outcome.recipes.len(), 1);
        assert_eq!(outcome.tier, Some("relaxed-prefix"));
    }

    #[test]
    fn test_anti_algorithm_cap_relaxes_at_third_tier() {
        let rules = RuleConfig::default();
        let mut state = CooldownState::new();
        state.anti_algorithm_week = rules.cooldowns.anti_algorithm_per_week;

        let baity = recipe("baity", "stop scrolling right now please");
        let outcome = filter(&rules, &[baity], &state);
        assert_eq!(outcome.recipes.len(), 1);
        assert_eq!(outcome.tier, Some("relaxed-anti-algo"));
        assert_eq!(outcome.warnings.len(), 2);
        assert!(outcome.warnings[1].contains("anti-algorithm"));
    }

    #[test]
    fn test_cta_streak_relaxes_at_last_tier() {
        let rules = RuleConfig::default();
        let mut state = CooldownState::new();
        // Two Engage plans in a row; the default streak cap is 2
        state.cta_intents.push_back(CtaIntent::Engage);
        state.cta_intents.push_back(CtaIntent::Engage);

        let outcome = filter(&rules, &[recipe("r1", "one more unique opener")], &state);
        assert_eq!(outcome.recipes.len(), 1);
        assert_eq!(outcome.tier, Some("relaxed-cta-streak"));
        assert_eq!(outcome.warnings.len(), 3);
    }

    #[test]
    fn test_hook_family_cap_is_never_relaxed() {
        let rules = RuleConfig::default();
        let mut state = CooldownState::new();
        state.hook_family_day.insert("family-r1".to_string(), 1);
        state.hook_family_week.insert("family-r1".to_string(), 1);

        let outcome = filter(&rules, &[recipe("r1", "yet another unique opener")], &state);
        assert!(outcome.recipes.is_empty());
        assert!(outcome.tier.is_none());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_disabled_and_missing_caption_never_pass() {
        let rules = RuleConfig::default();
        let state = CooldownState::new();

        let mut disabled = recipe("off", "disabled recipe opener words");
        disabled.enabled = false;
        let mut captionless = recipe("blank", "captionless recipe opener words");
        captionless.caption_template = "  ".to_string();

        let outcome = filter(&rules, &[disabled, captionless], &state);
        assert!(outcome.recipes.is_empty());
    }
}

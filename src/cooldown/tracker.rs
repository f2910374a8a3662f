//! Builds the cooldown snapshot from plan history.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::config::RuleConfig;
use crate::cooldown::state::CooldownState;
use crate::domain::{Container, CtaKind, Plan, Recipe, Snippet};
use crate::planner::text;

/// Scans recent plans and derives the recency sets and counters the
/// filters consume.
pub struct CooldownTracker;

impl CooldownTracker {
    /// Build a snapshot of everything used within its window, relative to
    /// `now` captured once here. Recipes resolve each plan's CTA kind;
    /// snippets resolve each plan's section label.
    pub fn build(
        rules: &RuleConfig,
        history: &[Plan],
        recipes: &[Recipe],
        snippets: &[Snippet],
        now: DateTime<Utc>,
    ) -> CooldownState {
        let cd = &rules.cooldowns;
        let mut state = CooldownState::new();

        let recipe_kind: HashMap<&str, Option<CtaKind>> = recipes.iter().map(|r| (r.id.as_str(), r.cta_kind)).collect();
        let snippet_section: HashMap<&str, &str> =
            snippets.iter().map(|s| (s.id.as_str(), s.section.as_str())).collect();

        let horizon = now - Duration::days(cd.max_window_days());
        let today = now.date_naive();

        // Most recent first so the rolling intent history reads forward.
        // Plans scheduled later today (or beyond) are committed content and
        // count as recent too.
        let mut recent: Vec<&Plan> = history.iter().filter(|p| p.scheduled_at >= horizon).collect();
        recent.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));

        tracing::debug!(
            plans = recent.len(),
            horizon_days = cd.max_window_days(),
            "Building cooldown state from history"
        );

        for plan in recent {
            let within_hours = |hours: i64| plan.scheduled_at >= now - Duration::hours(hours);
            let within_days = |days: i64| plan.scheduled_at >= now - Duration::days(days);
            let same_day = plan.scheduled_at.date_naive() == today;

            if cd.recipe_days > 0 && within_days(cd.recipe_days) {
                state.recipes_strict.insert(plan.recipe_id.clone());
            }
            if cd.recipe_days_relaxed > 0 && within_days(cd.recipe_days_relaxed) {
                state.recipes_relaxed.insert(plan.recipe_id.clone());
            }
            if cd.beat1_exact_days > 0 && within_days(cd.beat1_exact_days) {
                state.beat1_exact.insert(text::normalize_exact(&plan.line1));
            }
            if cd.beat1_prefix_days > 0 && within_days(cd.beat1_prefix_days) {
                state
                    .beat1_prefixes
                    .insert(text::word_prefix(&plan.line1, cd.beat1_prefix_words));
            }
            if cd.beat2_exact_days > 0 && within_days(cd.beat2_exact_days) {
                state.beat2_exact.insert(text::normalize_exact(&plan.line2));
            }
            if cd.caption_exact_days > 0 && within_days(cd.caption_exact_days) {
                state.captions_exact.insert(text::normalize_caption(&plan.caption));
            }
            if cd.snippet_hours > 0 && within_hours(cd.snippet_hours) {
                state.snippets.insert(plan.snippet_id.clone());
            }
            if cd.track_hours > 0 && within_hours(cd.track_hours) {
                state.tracks.insert(plan.track_id.clone());
            }
            if cd.clip_hours > 0 && within_hours(cd.clip_hours) {
                for id in &plan.clip_ids {
                    state.clips.insert(id.clone());
                }
            }
            if plan.container == Container::Montage
                && cd.montage_signature_hours > 0
                && within_hours(cd.montage_signature_hours)
            {
                state.montage_signatures.insert(plan.clip_signature());
            }

            if !plan.hook_family.is_empty() {
                if same_day {
                    *state.hook_family_day.entry(plan.hook_family.clone()).or_insert(0) += 1;
                }
                if within_days(7) {
                    *state.hook_family_week.entry(plan.hook_family.clone()).or_insert(0) += 1;
                }
            }

            if within_days(7) {
                let combined = format!("{} {} {}", plan.line1, plan.line2, plan.caption);
                if text::matches_anti_algorithm(&combined) {
                    state.anti_algorithm_week += 1;
                }
            }

            let kind = recipe_kind.get(plan.recipe_id.as_str()).copied().flatten();
            if same_day && kind == Some(CtaKind::Comment) {
                state.comment_ctas_today += 1;
            }
            if let Some(k) = kind
                && state.cta_intents.len() < cd.cta_intent_history_len
            {
                state.cta_intents.push_back(k.intent());
            }

            if same_day
                && let Some(section) = snippet_section.get(plan.snippet_id.as_str())
            {
                *state.section_styles_today.entry(section.to_string()).or_insert(0) += 1;
            }
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CtaIntent, PlanExperiment, PlanStatus, SelectionMode};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
    }

    fn plan_at(hours_ago: i64, id: &str, recipe_id: &str) -> Plan {
        Plan {
            id: id.to_string(),
            scheduled_at: now() - Duration::hours(hours_ago),
            container: Container::Montage,
            clip_ids: vec![format!("{id}-c1"), format!("{id}-c2")],
            track_id: format!("{id}-track"),
            snippet_id: format!("{id}-snippet"),
            snippet_start: 10.0,
            snippet_duration: 8.0,
            line1: format!("hook line for {id}"),
            line2: format!("payoff line for {id}"),
            caption: format!("caption for {id} #studio"),
            recipe_id: recipe_id.to_string(),
            hook_family: "pov".to_string(),
            compat_score: 0.8,
            reasons: vec![],
            status: PlanStatus::Posted,
            experiment: PlanExperiment {
                container: SelectionMode::Exploit,
                recipe: SelectionMode::Exploit,
                cta: Some(SelectionMode::Exploit),
                snippet_strategy: SelectionMode::Exploit,
                anchor_clip: None,
            },
            created_at: 0,
        }
    }

    fn recipe_with_kind(id: &str, kind: CtaKind) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: id.to_string(),
            beat1: "b1".to_string(),
            beat2: "b2".to_string(),
            caption_template: "{track}".to_string(),
            cta_kind: Some(kind),
            allowed_moments: vec![],
            disallowed_containers: vec![],
            hook_family: Some("pov".to_string()),
            enabled: true,
            locked: false,
        }
    }

    fn snippet_with_section(id: &str, section: &str) -> Snippet {
        Snippet {
            id: id.to_string(),
            track_id: "t".to_string(),
            start: 0.0,
            duration: 8.0,
            moment_3_to_7: false,
            moment_7_to_11: false,
            section: section.to_string(),
            energy: 0.5,
        }
    }

    #[test]
    fn test_recipe_windows_strict_vs_relaxed() {
        let rules = RuleConfig::default();
        // 2 days ago: inside both windows. 5 days ago: strict only.
        // 10 days ago: neither.
        let history = vec![
            plan_at(2 * 24, "p1", "recent"),
            plan_at(5 * 24, "p2", "mid"),
            plan_at(10 * 24, "p3", "old"),
        ];
        let state = CooldownTracker::build(&rules, &history, &[], &[], now());

        assert!(state.recipes_strict.contains("recent"));
        assert!(state.recipes_relaxed.contains("recent"));
        assert!(state.recipes_strict.contains("mid"));
        assert!(!state.recipes_relaxed.contains("mid"));
        assert!(!state.recipes_strict.contains("old"));
    }

    #[test]
    fn test_beat1_exact_outlives_prefix_window() {
        let rules = RuleConfig::default();
        // 10 days: inside the 14d exact window, outside the 7d prefix window
        let history = vec![plan_at(10 * 24, "p1", "r1")];
        let state = CooldownTracker::build(&rules, &history, &[], &[], now());

        assert!(state.beat1_exact.contains(&text::normalize_exact("hook line for p1")));
        assert!(state.beat1_prefixes.is_empty());
    }

    #[test]
    fn test_hour_windows() {
        let rules = RuleConfig::default();
        // 6h: clips (12h), tracks (24h), snippets (72h) all register.
        // 26h: clips and tracks expired, snippet still present.
        let history = vec![plan_at(6, "fresh", "r1"), plan_at(26, "stale", "r2")];
        let state = CooldownTracker::build(&rules, &history, &[], &[], now());

        assert!(state.clips.contains("fresh-c1"));
        assert!(state.tracks.contains("fresh-track"));
        assert!(state.snippets.contains("fresh-snippet"));

        assert!(!state.clips.contains("stale-c1"));
        assert!(!state.tracks.contains("stale-track"));
        assert!(state.snippets.contains("stale-snippet"));
    }

    #[test]
    fn test_montage_signature_window() {
        let rules = RuleConfig::default();
        let history = vec![plan_at(6, "p1", "r1")];
        let state = CooldownTracker::build(&rules, &history, &[], &[], now());
        assert!(state.montage_signatures.contains("p1-c1+p1-c2"));
    }

    #[test]
    fn test_hook_family_day_vs_week_counters() {
        let rules = RuleConfig::default();
        // Two plans earlier today, one three days back, all family "pov"
        let history = vec![plan_at(2, "p1", "r1"), plan_at(5, "p2", "r2"), plan_at(3 * 24, "p3", "r3")];
        let state = CooldownTracker::build(&rules, &history, &[], &[], now());
        assert_eq!(state.hook_family_counts("pov"), (2, 3));
    }

    #[test]
    fn test_comment_cta_counter_and_intent_order() {
        let rules = RuleConfig::default();
        let recipes = vec![
            recipe_with_kind("r-follow", CtaKind::Follow),
            recipe_with_kind("r-comment", CtaKind::Comment),
        ];
        // Most recent plan asks for a follow, the one before for a comment
        let history = vec![plan_at(1, "p1", "r-follow"), plan_at(3, "p2", "r-comment")];
        let state = CooldownTracker::build(&rules, &history, &recipes, &[], now());

        assert_eq!(state.comment_ctas_today, 1);
        let intents: Vec<CtaIntent> = state.cta_intents.iter().copied().collect();
        assert_eq!(intents, vec![CtaIntent::Grow, CtaIntent::Engage]);
    }

    #[test]
    fn test_intent_history_capped_at_config() {
        let mut rules = RuleConfig::default();
        rules.cooldowns.cta_intent_history_len = 2;
        let recipes = vec![recipe_with_kind("r1", CtaKind::Share)];
        let history = vec![plan_at(1, "p1", "r1"), plan_at(2, "p2", "r1"), plan_at(3, "p3", "r1")];
        let state = CooldownTracker::build(&rules, &history, &recipes, &[], now());
        assert_eq!(state.cta_intents.len(), 2);
    }

    #[test]
    fn test_section_styles_today() {
        let rules = RuleConfig::default();
        let snippets = vec![
            snippet_with_section("p1-snippet", "drop"),
            snippet_with_section("p2-snippet", "drop"),
            snippet_with_section("p3-snippet", "verse"),
        ];
        // p3 ran yesterday, so only today's two drops count
        let history = vec![plan_at(1, "p1", "r1"), plan_at(4, "p2", "r2"), plan_at(25, "p3", "r3")];
        let state = CooldownTracker::build(&rules, &history, &[], &snippets, now());

        assert_eq!(state.section_style_count("drop"), 2);
        assert_eq!(state.section_style_count("verse"), 0);
    }

    #[test]
    fn test_future_scheduled_plans_count_as_recent() {
        let rules = RuleConfig::default();
        // Committed earlier in the batch for a slot later today
        let history = vec![plan_at(-4, "p1", "r1")];
        let state = CooldownTracker::build(&rules, &history, &[], &[], now());
        assert!(state.recipes_strict.contains("r1"));
        assert!(state.clips.contains("p1-c1"));
    }

    #[test]
    fn test_plans_outside_horizon_are_ignored() {
        let rules = RuleConfig::default();
        let history = vec![plan_at(20 * 24, "p1", "r1")];
        let state = CooldownTracker::build(&rules, &history, &[], &[], now());
        assert!(state.recipes_strict.is_empty());
        assert!(state.beat1_exact.is_empty());
        assert!(state.hook_family_week.is_empty());
    }
}

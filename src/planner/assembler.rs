//! Batch planning loop and the per-slot state machine.
//!
//! `build_plans` runs slots strictly in sequence: each committed slot
//! mutates the cooldown state and the stats book before the next slot
//! selects, so a batch never double-books a recipe, snippet, track, or
//! clip whose window is live. A failed stage skips the slot with a
//! warning and never retries or rolls back earlier slots.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::bandit::{ArmStats, ArmType, LockableCandidate, SelectParams, StatsBook, select, select_lockable};
use crate::config::RuleConfig;
use crate::cooldown::{CooldownState, CooldownTracker};
use crate::domain::{Clip, Container, Cta, PlanDraft, PlanExperiment, Recipe, SelectionMode, Snippet, Track};
use crate::error::Result;
use crate::planner::{clipset, compat, recipes, text};
use crate::recovery::{METRICS_BASELINE_DAYS, METRICS_CURRENT_DAYS, RecoveryMonitor};
use crate::store::PipelineStore;

/// Stages a slot moves through, in order. A failure at any stage
/// abandons the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStage {
    SelectContainer,
    BuildClipSet,
    FilterRecipes,
    SelectRecipe,
    CheckContainerCompat,
    SelectSnippet,
    ExpandClipSet,
    ScoreCompat,
    BuildText,
    Commit,
}

impl SlotStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStage::SelectContainer => "select-container",
            SlotStage::BuildClipSet => "build-clip-set",
            SlotStage::FilterRecipes => "filter-recipes",
            SlotStage::SelectRecipe => "select-recipe",
            SlotStage::CheckContainerCompat => "check-container-compat",
            SlotStage::SelectSnippet => "select-snippet",
            SlotStage::ExpandClipSet => "expand-clip-set",
            SlotStage::ScoreCompat => "score-compat",
            SlotStage::BuildText => "build-text",
            SlotStage::Commit => "commit",
        }
    }
}

impl fmt::Display for SlotStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How one slot ended.
#[derive(Debug, Clone)]
pub enum SlotOutcome {
    Committed { plan_id: String, warnings: Vec<String> },
    Skipped { stage: SlotStage, reason: String },
}

/// Result of a whole `build_plans` run.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub created_ids: Vec<String>,
    pub warnings: Vec<String>,
}

/// How a snippet is matched once the strategy arm has been drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetStrategy {
    Moment3to7,
    Moment7to11,
    HighEnergy,
    Any,
}

impl SnippetStrategy {
    pub const ALL: [SnippetStrategy; 4] = [
        SnippetStrategy::Moment3to7,
        SnippetStrategy::Moment7to11,
        SnippetStrategy::HighEnergy,
        SnippetStrategy::Any,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SnippetStrategy::Moment3to7 => "moment-3-7",
            SnippetStrategy::Moment7to11 => "moment-7-11",
            SnippetStrategy::HighEnergy => "high-energy",
            SnippetStrategy::Any => "any",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "moment-3-7" => Some(SnippetStrategy::Moment3to7),
            "moment-7-11" => Some(SnippetStrategy::Moment7to11),
            "high-energy" => Some(SnippetStrategy::HighEnergy),
            "any" => Some(SnippetStrategy::Any),
            _ => None,
        }
    }

    pub fn matches(&self, snippet: &Snippet, rules: &RuleConfig) -> bool {
        match self {
            SnippetStrategy::Moment3to7 => snippet.moment_3_to_7,
            SnippetStrategy::Moment7to11 => snippet.moment_7_to_11,
            SnippetStrategy::HighEnergy => snippet.energy >= rules.snippets.high_energy_threshold,
            SnippetStrategy::Any => true,
        }
    }
}

impl fmt::Display for SnippetStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serializes scheduling runs and carries the shared random source.
struct BatchGuard {
    rng: StdRng,
}

/// Catalog snapshot one batch runs against.
struct SlotContext<'a> {
    rules: &'a RuleConfig,
    clips: &'a [Clip],
    snippets: &'a [Snippet],
    tracks: &'a [Track],
    recipes: &'a [Recipe],
    ctas: &'a [Cta],
}

/// Builds scheduled post plans slot by slot.
pub struct PlanAssembler<S> {
    store: Arc<S>,
    rules: RuleConfig,
    guard: Mutex<BatchGuard>,
}

impl<S: PipelineStore> PlanAssembler<S> {
    pub fn new(store: Arc<S>, rules: RuleConfig) -> Self {
        Self {
            store,
            rules,
            guard: Mutex::new(BatchGuard {
                rng: StdRng::from_os_rng(),
            }),
        }
    }

    /// Deterministic batches for tests and replays.
    pub fn with_seed(store: Arc<S>, rules: RuleConfig, seed: u64) -> Self {
        Self {
            store,
            rules,
            guard: Mutex::new(BatchGuard {
                rng: StdRng::seed_from_u64(seed),
            }),
        }
    }

    /// Plan up to `count` posts starting at `scheduled_for` (defaults to
    /// now), spaced evenly across the day at the effective cadence.
    ///
    /// Holds the batch guard for the whole run; concurrent callers queue.
    pub async fn build_plans(&self, count: u32, scheduled_for: Option<DateTime<Utc>>) -> Result<BatchOutcome> {
        let mut guard = self.guard.lock().await;
        let now = Utc::now();

        let daily = self
            .store
            .recent_day_metrics(METRICS_CURRENT_DAYS + METRICS_BASELINE_DAYS)
            .await?;
        let spam = self
            .store
            .error_count_since(now - Duration::days(METRICS_CURRENT_DAYS as i64))
            .await?;
        let monitor = RecoveryMonitor::new(self.rules.recovery.clone());
        let status = monitor.status(&daily, spam);
        let rules = monitor.effective_rules(&self.rules, &status);

        let clips = self.store.clips().await?;
        let snippets = self.store.snippets().await?;
        let tracks = self.store.tracks().await?;
        let recipes = self.store.recipes().await?;
        let ctas = self.store.ctas().await?;

        let horizon = now - Duration::days(rules.cooldowns.max_window_days());
        let history = self.store.plans_since(horizon).await?;
        let mut cooldown = CooldownTracker::build(&rules, &history, &recipes, &snippets, now);
        let mut book = self.store.stats_book().await?;

        let base = scheduled_for.unwrap_or(now);
        let spacing = Duration::hours(24) / rules.posts_per_day.max(1) as i32;
        tracing::info!(
            count,
            recovery = status.active,
            history = history.len(),
            "Starting planning batch"
        );

        let ctx = SlotContext {
            rules: &rules,
            clips: &clips,
            snippets: &snippets,
            tracks: &tracks,
            recipes: &recipes,
            ctas: &ctas,
        };

        let mut outcome = BatchOutcome::default();
        for slot in 0..count {
            let scheduled_at = base + spacing * slot as i32;
            match self
                .run_slot(&ctx, &mut cooldown, &mut book, &mut guard.rng, scheduled_at, now)
                .await?
            {
                SlotOutcome::Committed { plan_id, warnings } => {
                    outcome.created_ids.push(plan_id);
                    outcome.warnings.extend(warnings);
                }
                SlotOutcome::Skipped { stage, reason } => {
                    tracing::warn!(slot, stage = stage.as_str(), %reason, "Slot skipped");
                    outcome.warnings.push(reason);
                }
            }
        }

        tracing::info!(
            created = outcome.created_ids.len(),
            warnings = outcome.warnings.len(),
            "Planning batch finished"
        );
        Ok(outcome)
    }

    async fn run_slot(
        &self,
        ctx: &SlotContext<'_>,
        cooldown: &mut CooldownState,
        book: &mut StatsBook,
        rng: &mut StdRng,
        scheduled_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<SlotOutcome> {
        let params = SelectParams::from(&ctx.rules.bandit);
        let mut warnings = Vec::new();

        // SELECT_CONTAINER
        let container_ids: Vec<String> = ctx
            .rules
            .allowed_containers
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        let Some(container_sel) = select(book, ArmType::Container, &container_ids, &params, None, rng) else {
            return Ok(skip(SlotStage::SelectContainer, "No allowed containers."));
        };
        let Some(requested) = Container::parse(&container_sel.arm_id) else {
            return Ok(skip(SlotStage::SelectContainer, "Unknown container arm."));
        };

        // BUILD_CLIPSET
        let clip_pool: Vec<Clip> = ctx
            .clips
            .iter()
            .filter(|c| !cooldown.clips.contains(&c.id))
            .cloned()
            .collect();
        let mut clip_set = match clipset::assemble(requested, &clip_pool, ctx.rules, book, rng) {
            Ok(set) => set,
            Err(reason) => return Ok(skip(SlotStage::BuildClipSet, reason)),
        };

        // FILTER_RECIPES
        let filtered = recipes::filter(ctx.rules, ctx.recipes, cooldown);
        if filtered.recipes.is_empty() {
            return Ok(skip(SlotStage::FilterRecipes, "No eligible recipes after cooldown filters."));
        }
        warnings.extend(filtered.warnings);

        // SELECT_RECIPE
        let candidates: Vec<LockableCandidate> = filtered
            .recipes
            .iter()
            .map(|r| LockableCandidate::new(r.id.clone(), r.locked))
            .collect();
        let Some(recipe_sel) = select_lockable(
            book,
            ArmType::Recipe,
            &candidates,
            &params,
            ctx.rules.bandit.max_locked_share,
            None,
            rng,
        ) else {
            return Ok(skip(SlotStage::SelectRecipe, "No recipes to select."));
        };
        let Some(recipe) = filtered.recipes.iter().find(|r| r.id == recipe_sel.arm_id) else {
            return Ok(skip(SlotStage::SelectRecipe, "No recipes to select."));
        };

        // CHECK_CONTAINER_COMPATIBILITY
        if !recipe.allows_container(clip_set.container) {
            return Ok(skip(
                SlotStage::CheckContainerCompat,
                "Recipe disallows the selected container.",
            ));
        }

        // SELECT_SNIPPET
        let eligible: Vec<&Snippet> = ctx
            .snippets
            .iter()
            .filter(|s| !cooldown.snippets.contains(&s.id))
            .filter(|s| !cooldown.tracks.contains(&s.track_id))
            .filter(|s| recipe.allows_moment(s.moment()))
            .filter(|s| cooldown.section_style_count(&s.section) < ctx.rules.cooldowns.snippet_style_per_section_per_day)
            .collect();
        if eligible.is_empty() {
            return Ok(skip(SlotStage::SelectSnippet, "No eligible snippets."));
        }
        let strategy_ids: Vec<String> = SnippetStrategy::ALL.iter().map(|s| s.as_str().to_string()).collect();
        let Some(strategy_sel) = select(book, ArmType::SnippetStrategy, &strategy_ids, &params, None, rng) else {
            return Ok(skip(SlotStage::SelectSnippet, "No snippet strategies."));
        };
        let Some(strategy) = SnippetStrategy::parse(&strategy_sel.arm_id) else {
            return Ok(skip(SlotStage::SelectSnippet, "Unknown snippet strategy arm."));
        };
        let matching: Vec<&Snippet> = eligible
            .iter()
            .copied()
            .filter(|s| strategy.matches(s, ctx.rules))
            .collect();
        // A strategy with no matching snippet falls back to the whole
        // eligible pool rather than burning the slot
        let snippet_pool = if matching.is_empty() { &eligible } else { &matching };
        let snippet = snippet_pool[rng.random_range(0..snippet_pool.len())];

        // EXPAND_CLIPSET_FOR_DURATION
        if let Some(warning) = clipset::expand_for_duration(&mut clip_set, &clip_pool, snippet, ctx.rules, rng) {
            warnings.push(warning);
        }
        if clip_set.container == Container::Montage {
            let signature = clip_set.clip_ids.join("+");
            if cooldown.montage_signatures.contains(&signature) {
                return Ok(skip(SlotStage::ExpandClipSet, "Montage clip sequence repeats a recent post."));
            }
        }

        // SCORE_COMPATIBILITY
        let set_clips: Vec<&Clip> = clip_set
            .clip_ids
            .iter()
            .filter_map(|id| ctx.clips.iter().find(|c| c.id == *id))
            .collect();
        let report = compat::score(&set_clips, snippet, ctx.rules);
        if report.blocked {
            let reason = report
                .reasons
                .first()
                .cloned()
                .unwrap_or_else(|| "Clip set blocked.".to_string());
            return Ok(skip(SlotStage::ScoreCompat, reason));
        }
        if report.score < ctx.rules.compat.min_score {
            return Ok(skip(
                SlotStage::ScoreCompat,
                format!("Compatibility score {:.2} below minimum.", report.score),
            ));
        }

        // BUILD_TEXT
        let Some(track) = ctx.tracks.iter().find(|t| t.id == snippet.track_id) else {
            return Ok(skip(SlotStage::BuildText, "Snippet references an unknown track."));
        };
        let mut cta_pick: Option<(&Cta, SelectionMode)> = None;
        if let Some(kind) = recipe.cta_kind {
            let cta_candidates: Vec<LockableCandidate> = ctx
                .ctas
                .iter()
                .filter(|c| c.kind == kind && c.enabled)
                .map(|c| LockableCandidate::new(c.id.clone(), c.locked))
                .collect();
            if let Some(sel) = select_lockable(
                book,
                ArmType::Cta,
                &cta_candidates,
                &params,
                ctx.rules.bandit.max_locked_share,
                None,
                rng,
            ) && let Some(cta) = ctx.ctas.iter().find(|c| c.id == sel.arm_id)
            {
                cta_pick = Some((cta, sel.mode));
            }
        }
        let mut caption = text::render_caption(&recipe.caption_template, track);
        if let Some((cta, _)) = cta_pick
            && !cta.text.trim().is_empty()
        {
            caption.push(' ');
            caption.push_str(cta.text.trim());
        }
        let caption = text::append_hashtags(&caption, &ctx.rules.hashtags.pool, ctx.rules.hashtags.max_per_post);

        // COMMIT
        let draft = PlanDraft {
            scheduled_at,
            container: clip_set.container,
            clip_ids: clip_set.clip_ids.clone(),
            track_id: track.id.clone(),
            snippet_id: snippet.id.clone(),
            snippet_start: snippet.start,
            snippet_duration: snippet.duration,
            line1: recipe.beat1.clone(),
            line2: recipe.beat2.clone(),
            caption,
            recipe_id: recipe.id.clone(),
            hook_family: recipe.hook_family.clone().unwrap_or_default(),
            compat_score: report.score,
            reasons: report.reasons.clone(),
            experiment: PlanExperiment {
                container: container_sel.mode,
                recipe: recipe_sel.mode,
                cta: cta_pick.as_ref().map(|(_, mode)| *mode),
                snippet_strategy: strategy_sel.mode,
                anchor_clip: clip_set.anchor_mode,
            },
        };
        let plan = draft.commit();
        self.store.create_plan(&plan).await?;

        let now_millis = now.timestamp_millis();
        let mut pulled: Vec<ArmStats> = vec![
            book.record_pull(ArmType::Container, clip_set.container.as_str(), now_millis),
            book.record_pull(ArmType::Recipe, &recipe.id, now_millis),
            book.record_pull(ArmType::SnippetStrategy, strategy.as_str(), now_millis),
        ];
        if let Some((cta, _)) = &cta_pick {
            pulled.push(book.record_pull(ArmType::Cta, &cta.id, now_millis));
        }
        for clip in &set_clips {
            pulled.push(book.record_pull(ArmType::Clip, &clip.id, now_millis));
            pulled.push(book.record_pull(ArmType::ClipCategory, clip.category.as_str(), now_millis));
        }
        for stats in &pulled {
            self.store.upsert_arm(stats).await?;
        }

        cooldown.record_commit(&plan, cta_pick.as_ref().map(|(c, _)| c.kind), &snippet.section, ctx.rules);
        tracing::info!(
            plan_id = %plan.id,
            container = clip_set.container.as_str(),
            recipe = %recipe.id,
            snippet = %snippet.id,
            score = report.score,
            "Committed plan"
        );

        Ok(SlotOutcome::Committed {
            plan_id: plan.id,
            warnings,
        })
    }
}

fn skip(stage: SlotStage, reason: impl Into<String>) -> SlotOutcome {
    SlotOutcome::Skipped {
        stage,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClipCategory, CtaKind, Moment, SyncRisk};
    use crate::store::{MemoryStore, PlanStore, StatsStore};

    fn clip(id: &str, category: ClipCategory) -> Clip {
        Clip {
            id: id.to_string(),
            category,
            moment: Moment::Peak,
            sync_risk: SyncRisk::Safe,
            duration_secs: 3.0,
        }
    }

    fn snippet(id: &str, track_id: &str) -> Snippet {
        Snippet {
            id: id.to_string(),
            track_id: track_id.to_string(),
            start: 30.0,
            duration: 8.0,
            moment_3_to_7: true,
            moment_7_to_11: false,
            section: "drop".to_string(),
            energy: 0.9,
        }
    }

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: format!("title {id}"),
            artist: "artist".to_string(),
        }
    }

    fn recipe(id: &str, n: usize) -> Recipe {
        // Varied CTA kinds so back-to-back slots never share an intent
        let cta_kind = match n % 3 {
            0 => Some(CtaKind::Follow),
            1 => Some(CtaKind::Save),
            _ => None,
        };
        Recipe {
            id: id.to_string(),
            name: id.to_string(),
            beat1: format!("opener number {n} stands alone"),
            beat2: format!("payoff number {n} lands later"),
            caption_template: format!("take {n} on {{track}}"),
            cta_kind,
            allowed_moments: vec![],
            disallowed_containers: vec![],
            hook_family: Some(format!("family-{n}")),
            enabled: true,
            locked: false,
        }
    }

    fn healthy_store() -> Arc<MemoryStore> {
        let clips: Vec<Clip> = (0..14)
            .map(|i| {
                let category = if i < 2 { ClipCategory::DawCapture } else { ClipCategory::Studio };
                clip(&format!("c{i}"), category)
            })
            .collect();
        let snippets: Vec<Snippet> = (0..4).map(|i| snippet(&format!("sn{i}"), &format!("t{i}"))).collect();
        let tracks: Vec<Track> = (0..4).map(|i| track(&format!("t{i}"))).collect();
        let recipes: Vec<Recipe> = (0..5).map(|i| recipe(&format!("r{i}"), i)).collect();
        let ctas = vec![Cta {
            id: "cta-follow".to_string(),
            kind: CtaKind::Follow,
            text: "follow for part two".to_string(),
            enabled: true,
            locked: false,
        }];
        Arc::new(MemoryStore::with_catalog(clips, snippets, tracks, recipes, ctas))
    }

    #[tokio::test]
    async fn test_build_plans_creates_requested_count() {
        let store = healthy_store();
        let assembler = PlanAssembler::with_seed(store.clone(), RuleConfig::default(), 42);

        let outcome = assembler.build_plans(3, None).await.unwrap();
        assert_eq!(outcome.created_ids.len(), 3);
        assert!(outcome.warnings.is_empty());

        let plans = store.recent_plans(10).await.unwrap();
        assert_eq!(plans.len(), 3);
        for plan in &plans {
            assert!(plan.compat_score >= 0.5);
            assert!(!plan.caption.is_empty());
            assert!(plan.caption.contains('#'));
        }
    }

    #[tokio::test]
    async fn test_committed_choices_are_excluded_from_next_slot() {
        let store = healthy_store();
        let assembler = PlanAssembler::with_seed(store.clone(), RuleConfig::default(), 7);

        let outcome = assembler.build_plans(3, None).await.unwrap();
        assert_eq!(outcome.created_ids.len(), 3);

        let plans = store.recent_plans(10).await.unwrap();
        for a in 0..plans.len() {
            for b in (a + 1)..plans.len() {
                assert_ne!(plans[a].recipe_id, plans[b].recipe_id);
                assert_ne!(plans[a].snippet_id, plans[b].snippet_id);
                assert_ne!(plans[a].track_id, plans[b].track_id);
                for id in &plans[a].clip_ids {
                    assert!(!plans[b].clip_ids.contains(id));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_slots_are_spaced_by_cadence() {
        let store = healthy_store();
        let assembler = PlanAssembler::with_seed(store.clone(), RuleConfig::default(), 11);
        let base = Utc::now() + Duration::days(1);

        assembler.build_plans(2, Some(base)).await.unwrap();

        let mut plans = store.recent_plans(10).await.unwrap();
        plans.sort_by_key(|p| p.scheduled_at);
        assert_eq!(plans[0].scheduled_at, base);
        // 4 posts per day by default, 6 hours apart
        assert_eq!(plans[1].scheduled_at - plans[0].scheduled_at, Duration::hours(6));
    }

    #[tokio::test]
    async fn test_empty_clip_pool_skips_with_warning() {
        let store = Arc::new(MemoryStore::with_catalog(
            vec![],
            vec![snippet("sn0", "t0")],
            vec![track("t0")],
            vec![recipe("r0", 0)],
            vec![],
        ));
        let assembler = PlanAssembler::with_seed(store, RuleConfig::default(), 3);

        let outcome = assembler.build_plans(1, None).await.unwrap();
        assert!(outcome.created_ids.is_empty());
        assert_eq!(outcome.warnings, vec!["No eligible clips available.".to_string()]);
    }

    #[tokio::test]
    async fn test_no_recipes_skips_with_stable_warning() {
        let store = Arc::new(MemoryStore::with_catalog(
            (0..6).map(|i| clip(&format!("c{i}"), ClipCategory::Studio)).collect(),
            vec![snippet("sn0", "t0")],
            vec![track("t0")],
            vec![],
            vec![],
        ));
        let assembler = PlanAssembler::with_seed(store, RuleConfig::default(), 3);

        let outcome = assembler.build_plans(1, None).await.unwrap();
        assert!(outcome.created_ids.is_empty());
        assert_eq!(outcome.warnings, vec!["No eligible recipes after cooldown filters.".to_string()]);
    }

    #[tokio::test]
    async fn test_seeded_batches_are_reproducible() {
        let rules = RuleConfig::default();

        let store_a = healthy_store();
        let a = PlanAssembler::with_seed(store_a.clone(), rules.clone(), 99);
        a.build_plans(3, None).await.unwrap();

        let store_b = healthy_store();
        let b = PlanAssembler::with_seed(store_b.clone(), rules, 99);
        b.build_plans(3, None).await.unwrap();

        let mut plans_a = store_a.recent_plans(10).await.unwrap();
        let mut plans_b = store_b.recent_plans(10).await.unwrap();
        plans_a.sort_by_key(|p| p.scheduled_at);
        plans_b.sort_by_key(|p| p.scheduled_at);
        let picks_a: Vec<(&str, &str, &str)> = plans_a
            .iter()
            .map(|p| (p.recipe_id.as_str(), p.snippet_id.as_str(), p.container.as_str()))
            .collect();
        let picks_b: Vec<(&str, &str, &str)> = plans_b
            .iter()
            .map(|p| (p.recipe_id.as_str(), p.snippet_id.as_str(), p.container.as_str()))
            .collect();
        assert_eq!(picks_a, picks_b);
    }

    #[tokio::test]
    async fn test_pulls_recorded_for_committed_arms() {
        let store = healthy_store();
        let assembler = PlanAssembler::with_seed(store.clone(), RuleConfig::default(), 5);

        assembler.build_plans(1, None).await.unwrap();

        let plans = store.recent_plans(1).await.unwrap();
        let plan = &plans[0];
        let book = store.stats_book().await.unwrap();
        assert_eq!(book.pulls(ArmType::Recipe, &plan.recipe_id), 1);
        assert_eq!(book.pulls(ArmType::Container, plan.container.as_str()), 1);
        for id in &plan.clip_ids {
            assert_eq!(book.pulls(ArmType::Clip, id), 1);
        }
    }

    #[test]
    fn test_snippet_strategy_parse_roundtrip() {
        for strategy in SnippetStrategy::ALL {
            assert_eq!(SnippetStrategy::parse(strategy.as_str()), Some(strategy));
        }
        assert!(SnippetStrategy::parse("whatever").is_none());
    }

    #[test]
    fn test_snippet_strategy_matching() {
        let rules = RuleConfig::default();
        let mut s = snippet("sn0", "t0");
        s.moment_3_to_7 = false;
        s.moment_7_to_11 = true;
        s.energy = 0.5;

        assert!(!SnippetStrategy::Moment3to7.matches(&s, &rules));
        assert!(SnippetStrategy::Moment7to11.matches(&s, &rules));
        assert!(!SnippetStrategy::HighEnergy.matches(&s, &rules));
        assert!(SnippetStrategy::Any.matches(&s, &rules));
    }
}

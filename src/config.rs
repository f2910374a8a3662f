//! Configuration: app settings plus the posting rule snapshot.
//!
//! Loaded from .reelplan.yml or ~/.config/reelplan/reelplan.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{Container, CtaKind};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,

    /// Storage settings.
    pub storage: StorageConfig,

    /// Posting policy snapshot the planner runs against.
    pub rules: RuleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            storage: StorageConfig::default(),
            rules: RuleConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .reelplan.yml in current directory
    /// 3. ~/.config/reelplan/reelplan.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit path takes precedence
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project config
        let project_config = PathBuf::from(".reelplan.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from .reelplan.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load .reelplan.yml: {}", e);
                }
            }
        }

        // Try user config
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("reelplan").join("reelplan.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.rules.validate()
    }
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Account handle the store directory is derived from.
    pub account: String,

    /// Explicit store directory; overrides the account-derived default.
    #[serde(rename = "store-dir")]
    pub store_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account: "default".to_string(),
            store_dir: None,
        }
    }
}

/// Immutable posting policy snapshot: cadence, guardrails, bandit
/// hyperparameters, allowed containers and CTAs.
///
/// The planner never reads config files itself; it takes one of these
/// (possibly rewritten by recovery mode) per batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Posts planned per day.
    #[serde(rename = "posts-per-day")]
    pub posts_per_day: u32,

    /// Containers the planner may choose from.
    #[serde(rename = "allowed-containers")]
    pub allowed_containers: Vec<Container>,

    /// CTA kinds the planner may choose from.
    #[serde(rename = "allowed-cta-kinds")]
    pub allowed_cta_kinds: Vec<CtaKind>,

    /// Bandit hyperparameters.
    pub bandit: BanditConfig,

    /// Anti-repetition windows and caps.
    pub cooldowns: CooldownConfig,

    /// Clip set assembly limits.
    pub clipset: ClipSetConfig,

    /// Compatibility scoring knobs.
    pub compat: CompatConfig,

    /// Snippet selection knobs.
    pub snippets: SnippetConfig,

    /// Caption hashtag pool and cap.
    pub hashtags: HashtagConfig,

    /// Circuit breaker thresholds and overrides.
    pub recovery: RecoveryConfig,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            posts_per_day: 4,
            allowed_containers: vec![Container::Static, Container::Montage],
            allowed_cta_kinds: vec![
                CtaKind::Comment,
                CtaKind::Follow,
                CtaKind::Share,
                CtaKind::Save,
                CtaKind::Link,
            ],
            bandit: BanditConfig::default(),
            cooldowns: CooldownConfig::default(),
            clipset: ClipSetConfig::default(),
            compat: CompatConfig::default(),
            snippets: SnippetConfig::default(),
            hashtags: HashtagConfig::default(),
            recovery: RecoveryConfig::default(),
        }
    }
}

impl RuleConfig {
    /// Validate the rule snapshot.
    pub fn validate(&self) -> Result<()> {
        if self.posts_per_day == 0 {
            eyre::bail!("rules.posts-per-day must be > 0");
        }
        if self.allowed_containers.is_empty() {
            eyre::bail!("rules.allowed-containers must not be empty");
        }
        if !(0.0..=1.0).contains(&self.bandit.exploration_budget) {
            eyre::bail!("bandit.exploration-budget must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.bandit.max_locked_share) {
            eyre::bail!("bandit.max-locked-share must be in [0, 1]");
        }
        if self.bandit.prior_weight < 0.0 {
            eyre::bail!("bandit.prior-weight must be >= 0");
        }
        if self.cooldowns.beat1_prefix_words == 0 {
            eyre::bail!("cooldowns.beat1-prefix-words must be > 0");
        }
        if self.clipset.montage_min_clips < 2 {
            eyre::bail!("clipset.montage-min-clips must be >= 2");
        }
        if self.clipset.montage_min_clips > self.clipset.montage_max_clips {
            eyre::bail!("clipset.montage-min-clips must be <= montage-max-clips");
        }
        if self.clipset.montage_clip_min_secs <= 0.0
            || self.clipset.montage_clip_min_secs > self.clipset.montage_clip_max_secs
        {
            eyre::bail!("clipset montage clip duration range is invalid");
        }
        if !(0.0..=1.0).contains(&self.compat.min_score) {
            eyre::bail!("compat.min-score must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.recovery.views_drop_threshold)
            || !(0.0..=1.0).contains(&self.recovery.view2s_drop_threshold)
        {
            eyre::bail!("recovery drop thresholds must be in [0, 1]");
        }
        Ok(())
    }

    /// Whether the given container is currently allowed.
    pub fn allows_container(&self, container: Container) -> bool {
        self.allowed_containers.contains(&container)
    }

    /// Whether the given CTA kind is currently allowed.
    pub fn allows_cta_kind(&self, kind: CtaKind) -> bool {
        self.allowed_cta_kinds.contains(&kind)
    }
}

/// Bandit hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BanditConfig {
    /// Probability of a uniform exploration pick per selection.
    #[serde(rename = "exploration-budget")]
    pub exploration_budget: f64,

    /// Prior mean reward used for shrinkage.
    #[serde(rename = "prior-mean")]
    pub prior_mean: f64,

    /// Prior pseudo-count weight.
    #[serde(rename = "prior-weight")]
    pub prior_weight: f64,

    /// Exploit only once some arm has at least this many pulls.
    #[serde(rename = "min-pulls-before-exploit")]
    pub min_pulls_before_exploit: u64,

    /// Probability a locked arm is served instead of running the bandit.
    #[serde(rename = "max-locked-share")]
    pub max_locked_share: f64,
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            exploration_budget: 0.15,
            prior_mean: 0.5,
            prior_weight: 8.0,
            min_pulls_before_exploit: 5,
            max_locked_share: 0.30,
        }
    }
}

/// Anti-repetition windows and caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// Recipe reuse window, strict tier.
    #[serde(rename = "recipe-days")]
    pub recipe_days: i64,

    /// Recipe reuse window, relaxed tiers.
    #[serde(rename = "recipe-days-relaxed")]
    pub recipe_days_relaxed: i64,

    /// Exact beat-1 text reuse window.
    #[serde(rename = "beat1-exact-days")]
    pub beat1_exact_days: i64,

    /// Beat-1 opening-words reuse window.
    #[serde(rename = "beat1-prefix-days")]
    pub beat1_prefix_days: i64,

    /// How many leading words form the beat-1 prefix.
    #[serde(rename = "beat1-prefix-words")]
    pub beat1_prefix_words: usize,

    /// Exact beat-2 text reuse window.
    #[serde(rename = "beat2-exact-days")]
    pub beat2_exact_days: i64,

    /// Exact caption reuse window (hashtags stripped before comparing).
    #[serde(rename = "caption-exact-days")]
    pub caption_exact_days: i64,

    /// Snippet reuse window.
    #[serde(rename = "snippet-hours")]
    pub snippet_hours: i64,

    /// Track reuse window.
    #[serde(rename = "track-hours")]
    pub track_hours: i64,

    /// Clip reuse window.
    #[serde(rename = "clip-hours")]
    pub clip_hours: i64,

    /// Exact montage clip-sequence reuse window.
    #[serde(rename = "montage-signature-hours")]
    pub montage_signature_hours: i64,

    /// Max plans per hook family per day.
    #[serde(rename = "hook-family-per-day")]
    pub hook_family_per_day: u32,

    /// Max plans per hook family per week.
    #[serde(rename = "hook-family-per-week")]
    pub hook_family_per_week: u32,

    /// Max plans per week whose text trips the anti-algorithm phrase list.
    #[serde(rename = "anti-algorithm-per-week")]
    pub anti_algorithm_per_week: u32,

    /// Max comment-kind CTAs per day.
    #[serde(rename = "max-comment-ctas-per-day")]
    pub max_comment_ctas_per_day: u32,

    /// Max consecutive plans sharing one CTA intent.
    #[serde(rename = "max-same-cta-intent-in-row")]
    pub max_same_cta_intent_in_row: usize,

    /// How many recent CTA intents are kept for streak checks.
    #[serde(rename = "cta-intent-history-len")]
    pub cta_intent_history_len: usize,

    /// Max plans per snippet section label per day.
    #[serde(rename = "snippet-style-per-section-per-day")]
    pub snippet_style_per_section_per_day: u32,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            recipe_days: 7,
            recipe_days_relaxed: 3,
            beat1_exact_days: 14,
            beat1_prefix_days: 7,
            beat1_prefix_words: 4,
            beat2_exact_days: 7,
            caption_exact_days: 14,
            snippet_hours: 72,
            track_hours: 24,
            clip_hours: 12,
            montage_signature_hours: 168,
            hook_family_per_day: 1,
            hook_family_per_week: 3,
            anti_algorithm_per_week: 2,
            max_comment_ctas_per_day: 2,
            max_same_cta_intent_in_row: 2,
            cta_intent_history_len: 8,
            snippet_style_per_section_per_day: 2,
        }
    }
}

impl CooldownConfig {
    /// The widest window any cooldown field uses, in days, at least 7.
    pub fn max_window_days(&self) -> i64 {
        let day_windows = [
            self.recipe_days,
            self.recipe_days_relaxed,
            self.beat1_exact_days,
            self.beat1_prefix_days,
            self.beat2_exact_days,
            self.caption_exact_days,
            7, // hook family and anti-algorithm weekly counters
        ];
        let hour_windows = [
            self.snippet_hours,
            self.track_hours,
            self.clip_hours,
            self.montage_signature_hours,
        ];
        let max_days = day_windows.iter().copied().max().unwrap_or(7);
        // `i64::div_ceil` is unstable (int_roundings); this is its exact expansion.
        let max_hours = hour_windows.iter().copied().max().unwrap_or(0);
        let max_hour_days = max_hours / 24 + (max_hours % 24 > 0) as i64;
        max_days.max(max_hour_days).max(7)
    }
}

/// Clip set assembly limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipSetConfig {
    /// Minimum clips a montage needs before downgrading to static.
    #[serde(rename = "montage-min-clips")]
    pub montage_min_clips: usize,

    /// Montage clip count cap.
    #[serde(rename = "montage-max-clips")]
    pub montage_max_clips: usize,

    /// Usable per-clip duration floor in a montage, seconds.
    #[serde(rename = "montage-clip-min-secs")]
    pub montage_clip_min_secs: f64,

    /// Usable per-clip duration ceiling in a montage, seconds.
    #[serde(rename = "montage-clip-max-secs")]
    pub montage_clip_max_secs: f64,

    /// Static container clip cap during duration expansion.
    #[serde(rename = "static-max-clips")]
    pub static_max_clips: usize,
}

impl Default for ClipSetConfig {
    fn default() -> Self {
        Self {
            montage_min_clips: 3,
            montage_max_clips: 6,
            montage_clip_min_secs: 1.5,
            montage_clip_max_secs: 4.0,
            static_max_clips: 3,
        }
    }
}

/// Compatibility scoring knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatConfig {
    /// Score deducted per sensitive-sync clip.
    #[serde(rename = "sensitive-sync-penalty")]
    pub sensitive_sync_penalty: f64,

    /// Slots scoring below this are skipped.
    #[serde(rename = "min-score")]
    pub min_score: f64,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            sensitive_sync_penalty: 0.10,
            min_score: 0.5,
        }
    }
}

/// Snippet selection knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetConfig {
    /// Energy score at or above which a snippet counts as high-energy.
    #[serde(rename = "high-energy-threshold")]
    pub high_energy_threshold: f64,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            high_energy_threshold: 0.7,
        }
    }
}

/// Caption hashtag pool and cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HashtagConfig {
    /// Pool appended to captions, in order.
    pub pool: Vec<String>,

    /// Max hashtags per caption.
    #[serde(rename = "max-per-post")]
    pub max_per_post: usize,
}

impl Default for HashtagConfig {
    fn default() -> Self {
        Self {
            pool: vec![
                "#musicproducer".to_string(),
                "#beatmaker".to_string(),
                "#newmusic".to_string(),
                "#studio".to_string(),
                "#producerlife".to_string(),
            ],
            max_per_post: 5,
        }
    }
}

/// Circuit breaker thresholds and the overrides applied while active.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Median views drop that trips the breaker.
    #[serde(rename = "views-drop-threshold")]
    pub views_drop_threshold: f64,

    /// Early-retention drop that trips the breaker.
    #[serde(rename = "view2s-drop-threshold")]
    pub view2s_drop_threshold: f64,

    /// Spam/error count that trips the breaker.
    #[serde(rename = "spam-error-threshold")]
    pub spam_error_threshold: u32,

    /// Cadence while recovering.
    #[serde(rename = "posts-per-day")]
    pub posts_per_day: u32,

    /// Keep montage available while recovering.
    #[serde(rename = "allow-montage")]
    pub allow_montage: bool,

    /// Keep comment CTAs available while recovering.
    #[serde(rename = "allow-comment-ctas")]
    pub allow_comment_ctas: bool,

    /// Hashtag cap while recovering.
    #[serde(rename = "max-hashtags")]
    pub max_hashtags: usize,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            views_drop_threshold: 0.6,
            view2s_drop_threshold: 0.6,
            spam_error_threshold: 3,
            posts_per_day: 1,
            allow_montage: false,
            allow_comment_ctas: false,
            max_hashtags: 2,
        }
    }
}

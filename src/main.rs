use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use reelplan::bandit::{ArmStats, ArmType};
use reelplan::config::Config;
use reelplan::domain::{Clip, Cta, DayMetrics, Plan, PlanStatus, Recipe, Snippet, Track};
use reelplan::planner::PlanAssembler;
use reelplan::recovery::{METRICS_BASELINE_DAYS, METRICS_CURRENT_DAYS, RecoveryMonitor};
use reelplan::store::{CatalogStore, MetricsStore, PlanStore, SqliteStore, StatsStore};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reelplan")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("reelplan.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Plan { count, at, seed } => handle_plan_command(*count, at.as_deref(), *seed, config).await,
        Commands::List { status, limit } => handle_list_command(status.as_deref(), *limit, config).await,
        Commands::Status { id } => handle_status_command(id, config).await,
        Commands::Stats { arm_type } => handle_stats_command(arm_type.as_deref(), config).await,
        Commands::Recovery => handle_recovery_command(config).await,
        Commands::Import { file } => handle_import_command(file, config).await,
        Commands::Reward {
            id,
            value,
            impressions,
            conversions,
            arms,
            mark_posted,
        } => handle_reward_command(id, *value, *impressions, *conversions, arms, *mark_posted, config).await,
    }
}

fn open_store(config: &Config) -> Result<SqliteStore> {
    let store = SqliteStore::open(&config.storage.account, config.storage.store_dir.as_deref())
        .context("Failed to open store")?;
    Ok(store)
}

fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw).context(format!("Invalid RFC3339 timestamp: {raw}"))?;
    Ok(parsed.with_timezone(&Utc))
}

fn status_label(status: PlanStatus) -> ColoredString {
    let label = status.as_str();
    match status {
        PlanStatus::Planned => label.cyan(),
        PlanStatus::Rendered => label.blue(),
        PlanStatus::Pending => label.yellow(),
        PlanStatus::Posted => label.green(),
        PlanStatus::Failed => label.red(),
    }
}

fn print_plan_header() {
    println!(
        "{}",
        format!(
            "{:<20} {:<17} {:<8} {:<16} {:>5}  {}",
            "ID", "SCHEDULED", "FORMAT", "RECIPE", "SCORE", "STATUS"
        )
        .bold()
    );
}

fn print_plan_row(plan: &Plan) {
    println!(
        "{:<20} {:<17} {:<8} {:<16} {:>5.2}  {}",
        plan.id,
        plan.scheduled_at.format("%Y-%m-%d %H:%M"),
        plan.container.as_str(),
        plan.recipe_id,
        plan.compat_score,
        status_label(plan.status)
    );
}

async fn handle_plan_command(count: Option<u32>, at: Option<&str>, seed: Option<u64>, config: &Config) -> Result<()> {
    let scheduled_for = at.map(parse_rfc3339).transpose()?;
    let count = count.unwrap_or(config.rules.posts_per_day);
    info!("Planning batch of {} slots", count);

    let store = Arc::new(open_store(config)?);
    let assembler = match seed {
        Some(seed) => PlanAssembler::with_seed(store.clone(), config.rules.clone(), seed),
        None => PlanAssembler::new(store.clone(), config.rules.clone()),
    };
    let outcome = assembler.build_plans(count, scheduled_for).await?;

    println!(
        "{} {} of {} slots committed",
        "Planned:".green(),
        outcome.created_ids.len(),
        count
    );
    if !outcome.created_ids.is_empty() {
        print_plan_header();
        for id in &outcome.created_ids {
            if let Some(plan) = store.plan(id).await? {
                print_plan_row(&plan);
            }
        }
    }
    for warning in &outcome.warnings {
        println!("{} {}", "warning:".yellow(), warning);
    }
    Ok(())
}

async fn handle_list_command(status: Option<&str>, limit: usize, config: &Config) -> Result<()> {
    let filter = status
        .map(|s| PlanStatus::parse(s).ok_or_else(|| eyre!("Unknown status: {s}")))
        .transpose()?;
    info!("Listing plans - status: {:?}, limit: {}", status, limit);

    let store = open_store(config)?;
    let plans: Vec<Plan> = store
        .recent_plans(limit)
        .await?
        .into_iter()
        .filter(|p| filter.map_or(true, |f| p.status == f))
        .collect();

    if plans.is_empty() {
        println!("{}", "No plans found".yellow());
        return Ok(());
    }
    print_plan_header();
    for plan in &plans {
        print_plan_row(plan);
    }
    Ok(())
}

async fn handle_status_command(id: &str, config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let plan = store.plan(id).await?.ok_or_else(|| eyre!("No plan with id {id}"))?;

    println!("{} {}", "Plan".bold(), plan.id.bold());
    println!("  status:      {}", status_label(plan.status));
    println!("  scheduled:   {}", plan.scheduled_at.to_rfc3339());
    println!("  container:   {}", plan.container);
    println!("  clips:       {}", plan.clip_ids.join(" + "));
    println!("  track:       {}", plan.track_id);
    println!(
        "  snippet:     {} ({:.1}s from {:.1}s)",
        plan.snippet_id, plan.snippet_duration, plan.snippet_start
    );
    let hook_family = if plan.hook_family.is_empty() {
        "-"
    } else {
        plan.hook_family.as_str()
    };
    println!("  recipe:      {} (hook family: {})", plan.recipe_id, hook_family);
    println!("  line1:       {}", plan.line1);
    println!("  line2:       {}", plan.line2);
    println!("  caption:     {}", plan.caption);
    println!("  score:       {:.2}", plan.compat_score);
    if !plan.reasons.is_empty() {
        println!("  reasons:     {}", plan.reasons.join("; "));
    }
    let experiment = &plan.experiment;
    println!(
        "  selection:   container={} recipe={} cta={} strategy={} anchor={}",
        experiment.container,
        experiment.recipe,
        experiment.cta.map(|m| m.as_str()).unwrap_or("-"),
        experiment.snippet_strategy,
        experiment.anchor_clip.map(|m| m.as_str()).unwrap_or("-"),
    );
    if let Some(created) = Utc.timestamp_millis_opt(plan.created_at).single() {
        println!("  created:     {}", created.to_rfc3339());
    }
    Ok(())
}

async fn handle_stats_command(arm_type: Option<&str>, config: &Config) -> Result<()> {
    let filter = arm_type
        .map(|s| ArmType::parse(s).ok_or_else(|| eyre!("Unknown arm type: {s}")))
        .transpose()?;

    let store = open_store(config)?;
    let book = store.stats_book().await?;
    let bandit = &config.rules.bandit;

    let mut arms: Vec<&ArmStats> = book
        .all()
        .filter(|a| filter.map_or(true, |f| a.arm_type == f))
        .collect();
    if arms.is_empty() {
        println!("{}", "No arm statistics recorded yet".yellow());
        return Ok(());
    }
    arms.sort_by(|a, b| {
        a.arm_type
            .as_str()
            .cmp(b.arm_type.as_str())
            .then(b.pulls.cmp(&a.pulls))
            .then(a.arm_id.cmp(&b.arm_id))
    });

    println!(
        "{}",
        format!(
            "{:<17} {:<24} {:>6} {:>7} {:>6} {:>8} {:>6}",
            "TYPE", "ARM", "PULLS", "MEAN", "TODAY", "IMPR", "CONV"
        )
        .bold()
    );
    for arm in arms {
        let mean = arm.shrunk_mean(bandit.prior_mean, bandit.prior_weight);
        println!(
            "{:<17} {:<24} {:>6} {:>7.3} {:>6} {:>8} {:>6}",
            arm.arm_type.as_str(),
            arm.arm_id,
            arm.pulls,
            mean,
            arm.uses_today,
            arm.impressions,
            arm.conversions
        );
    }
    Ok(())
}

async fn handle_recovery_command(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let daily = store
        .recent_day_metrics(METRICS_CURRENT_DAYS + METRICS_BASELINE_DAYS)
        .await?;
    let spam_since = Utc::now() - Duration::days(METRICS_CURRENT_DAYS as i64);
    let spam_errors = store.error_count_since(spam_since).await?;

    let thresholds = &config.rules.recovery;
    let monitor = RecoveryMonitor::new(thresholds.clone());
    let status = monitor.status(&daily, spam_errors);

    println!("{}", "Account health".bold());
    println!("  metric days:  {}", daily.len());
    println!(
        "  views drop:   {:.0}% (threshold {:.0}%)",
        status.views_drop * 100.0,
        thresholds.views_drop_threshold * 100.0
    );
    println!(
        "  view2s drop:  {:.0}% (threshold {:.0}%)",
        status.view2s_drop * 100.0,
        thresholds.view2s_drop_threshold * 100.0
    );
    println!(
        "  spam errors:  {} (threshold {})",
        status.spam_errors, thresholds.spam_error_threshold
    );

    if status.active {
        println!("  breaker:      {}", "ACTIVE".red().bold());
        let effective = monitor.effective_rules(&config.rules, &status);
        let containers: Vec<&str> = effective.allowed_containers.iter().map(|c| c.as_str()).collect();
        println!("{}", "Recovery overrides".bold());
        println!("  posts/day:    {}", effective.posts_per_day);
        println!("  containers:   {}", containers.join(", "));
        println!("  comment CTAs: {}/day", effective.cooldowns.max_comment_ctas_per_day);
        println!("  hashtags:     {}", effective.hashtags.max_per_post);
    } else {
        println!("  breaker:      {}", "idle".green());
    }
    Ok(())
}

/// On-disk document consumed by `import`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogDocument {
    clips: Vec<Clip>,
    snippets: Vec<Snippet>,
    tracks: Vec<Track>,
    recipes: Vec<Recipe>,
    ctas: Vec<Cta>,
    metrics: Vec<DayMetrics>,
}

async fn handle_import_command(file: &Path, config: &Config) -> Result<()> {
    let content = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let doc: CatalogDocument = serde_yaml::from_str(&content).context("Failed to parse catalog file")?;

    let store = open_store(config)?;
    for clip in &doc.clips {
        store.put_clip(clip).await?;
    }
    for snippet in &doc.snippets {
        store.put_snippet(snippet).await?;
    }
    for track in &doc.tracks {
        store.put_track(track).await?;
    }
    for recipe in &doc.recipes {
        store.put_recipe(recipe).await?;
    }
    for cta in &doc.ctas {
        store.put_cta(cta).await?;
    }
    for metrics in &doc.metrics {
        store.upsert_day_metrics(metrics).await?;
    }

    info!("Imported catalog from {}", file.display());
    println!(
        "{} {} clips, {} snippets, {} tracks, {} recipes, {} CTAs, {} metric days",
        "Imported:".green(),
        doc.clips.len(),
        doc.snippets.len(),
        doc.tracks.len(),
        doc.recipes.len(),
        doc.ctas.len(),
        doc.metrics.len()
    );
    Ok(())
}

fn parse_arm_spec(spec: &str) -> Result<(ArmType, String)> {
    let Some((kind, arm_id)) = spec.split_once(':') else {
        return Err(eyre!("Arm must look like <type>:<id>, got '{spec}'"));
    };
    let arm_type = ArmType::parse(kind).ok_or_else(|| eyre!("Unknown arm type: {kind}"))?;
    if arm_id.is_empty() {
        return Err(eyre!("Arm must look like <type>:<id>, got '{spec}'"));
    }
    Ok((arm_type, arm_id.to_string()))
}

async fn handle_reward_command(
    id: &str,
    value: f64,
    impressions: u64,
    conversions: u64,
    extra_arms: &[String],
    mark_posted: bool,
    config: &Config,
) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(eyre!("Reward must be in [0, 1], got {value}"));
    }

    let store = open_store(config)?;
    let plan = store.plan(id).await?.ok_or_else(|| eyre!("No plan with id {id}"))?;
    let clips = store.clips().await?;

    // Arms reconstructable from the plan record. CTA and snippet-strategy
    // ids are not stored on the plan; they ride in via --arm.
    let mut targets: Vec<(ArmType, String)> = vec![
        (ArmType::Container, plan.container.as_str().to_string()),
        (ArmType::Recipe, plan.recipe_id.clone()),
    ];
    for clip_id in &plan.clip_ids {
        targets.push((ArmType::Clip, clip_id.clone()));
        if let Some(clip) = clips.iter().find(|c| c.id == *clip_id) {
            targets.push((ArmType::ClipCategory, clip.category.as_str().to_string()));
        }
    }
    for spec in extra_arms {
        targets.push(parse_arm_spec(spec)?);
    }

    let book = store.stats_book().await?;
    let mut touched: HashMap<(ArmType, String), ArmStats> = HashMap::new();
    for (arm_type, arm_id) in targets {
        let stats = touched.entry((arm_type, arm_id.clone())).or_insert_with(|| {
            book.get(arm_type, &arm_id)
                .cloned()
                .unwrap_or_else(|| ArmStats::new(arm_type, arm_id.clone()))
        });
        stats.record_reward(value);
        stats.record_outcome(impressions, conversions);
    }
    for stats in touched.values() {
        store.upsert_arm(stats).await?;
    }
    if mark_posted {
        store.set_plan_status(&plan.id, PlanStatus::Posted).await?;
    }

    info!("Rewarded plan {} across {} arms", plan.id, touched.len());
    println!(
        "{} {:.3} credited to {} arms for plan {}",
        "Rewarded:".green(),
        value,
        touched.len(),
        plan.id
    );
    if mark_posted {
        println!("  status now {}", status_label(PlanStatus::Posted));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}

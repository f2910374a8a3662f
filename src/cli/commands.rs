//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - plan: assemble the next batch of post plans
//! - list/status: inspect planned posts
//! - stats/recovery: inspect bandit arms and the circuit breaker
//! - import/reward: feed the catalog and performance data in

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reelplan - a bandit-driven post planner for short-form video
#[derive(Parser, Debug)]
#[command(name = "reelplan")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble the next batch of post plans
    Plan {
        /// How many slots to plan; defaults to the configured daily cadence
        #[arg(short = 'n', long)]
        count: Option<u32>,

        /// RFC3339 timestamp for the first slot; defaults to now
        #[arg(long)]
        at: Option<String>,

        /// Seed the batch RNG for reproducible assembly
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List recent plans
    List {
        /// Filter by status (planned, rendered, pending, posted, failed)
        #[arg(short, long)]
        status: Option<String>,

        /// How many plans to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Show one plan in full
    Status {
        /// Plan ID to inspect
        id: String,
    },

    /// Show bandit arm statistics
    Stats {
        /// Show only arms of this type (container, recipe, cta, clip,
        /// snippet-strategy, clip-category)
        #[arg(short = 't', long)]
        arm_type: Option<String>,
    },

    /// Show the account-health circuit breaker evaluation
    Recovery,

    /// Import a YAML catalog document (clips, snippets, tracks, recipes,
    /// CTAs, day metrics)
    Import {
        /// Path to the catalog file
        file: PathBuf,
    },

    /// Ingest a performance reward for a plan's arms
    Reward {
        /// Plan ID the reward belongs to
        id: String,

        /// Normalized reward in [0, 1]
        value: f64,

        /// Impressions to credit alongside the reward
        #[arg(long, default_value_t = 0)]
        impressions: u64,

        /// Conversions to credit alongside the reward
        #[arg(long, default_value_t = 0)]
        conversions: u64,

        /// Extra arms to credit, as <type>:<id> (e.g. cta:cta-follow)
        #[arg(long = "arm")]
        arms: Vec<String>,

        /// Also mark the plan posted
        #[arg(long)]
        mark_posted: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_requires_subcommand() {
        // Bare invocation should fall through to help
        let result = Cli::try_parse_from(["reelplan"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["reelplan", "-v", "recovery"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["reelplan", "-c", "/path/to/reelplan.yml", "recovery"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/reelplan.yml")));
    }

    #[test]
    fn test_plan_defaults() {
        let cli = Cli::try_parse_from(["reelplan", "plan"]).unwrap();
        match cli.command {
            Commands::Plan { count, at, seed } => {
                assert!(count.is_none());
                assert!(at.is_none());
                assert!(seed.is_none());
            }
            _ => panic!("Expected plan command"),
        }
    }

    #[test]
    fn test_plan_with_flags() {
        let cli = Cli::try_parse_from([
            "reelplan",
            "plan",
            "-n",
            "2",
            "--at",
            "2026-03-01T09:00:00Z",
            "--seed",
            "42",
        ])
        .unwrap();
        match cli.command {
            Commands::Plan { count, at, seed } => {
                assert_eq!(count, Some(2));
                assert_eq!(at, Some("2026-03-01T09:00:00Z".to_string()));
                assert_eq!(seed, Some(42));
            }
            _ => panic!("Expected plan command"),
        }
    }

    #[test]
    fn test_list_command() {
        let cli = Cli::try_parse_from(["reelplan", "list"]).unwrap();
        match cli.command {
            Commands::List { status, limit } => {
                assert!(status.is_none());
                assert_eq!(limit, 20);
            }
            _ => panic!("Expected list command"),
        }
    }

    #[test]
    fn test_list_with_filters() {
        let cli = Cli::try_parse_from(["reelplan", "list", "-s", "posted", "-l", "5"]).unwrap();
        match cli.command {
            Commands::List { status, limit } => {
                assert_eq!(status, Some("posted".to_string()));
                assert_eq!(limit, 5);
            }
            _ => panic!("Expected list command"),
        }
    }

    #[test]
    fn test_status_command() {
        let cli = Cli::try_parse_from(["reelplan", "status", "1738300800123-a1b2"]).unwrap();
        match cli.command {
            Commands::Status { id } => {
                assert_eq!(id, "1738300800123-a1b2");
            }
            _ => panic!("Expected status command"),
        }
    }

    #[test]
    fn test_stats_command() {
        let cli = Cli::try_parse_from(["reelplan", "stats", "-t", "recipe"]).unwrap();
        match cli.command {
            Commands::Stats { arm_type } => {
                assert_eq!(arm_type, Some("recipe".to_string()));
            }
            _ => panic!("Expected stats command"),
        }
    }

    #[test]
    fn test_recovery_command() {
        let cli = Cli::try_parse_from(["reelplan", "recovery"]).unwrap();
        assert!(matches!(cli.command, Commands::Recovery));
    }

    #[test]
    fn test_import_command() {
        let cli = Cli::try_parse_from(["reelplan", "import", "catalog.yml"]).unwrap();
        match cli.command {
            Commands::Import { file } => {
                assert_eq!(file, PathBuf::from("catalog.yml"));
            }
            _ => panic!("Expected import command"),
        }
    }

    #[test]
    fn test_reward_command() {
        let cli = Cli::try_parse_from([
            "reelplan",
            "reward",
            "1738300800123-a1b2",
            "0.8",
            "--impressions",
            "1200",
            "--conversions",
            "14",
            "--arm",
            "cta:cta-follow",
            "--arm",
            "snippet-strategy:high-energy",
            "--mark-posted",
        ])
        .unwrap();
        match cli.command {
            Commands::Reward {
                id,
                value,
                impressions,
                conversions,
                arms,
                mark_posted,
            } => {
                assert_eq!(id, "1738300800123-a1b2");
                assert_eq!(value, 0.8);
                assert_eq!(impressions, 1200);
                assert_eq!(conversions, 14);
                assert_eq!(arms, vec!["cta:cta-follow", "snippet-strategy:high-energy"]);
                assert!(mark_posted);
            }
            _ => panic!("Expected reward command"),
        }
    }

    #[test]
    fn test_reward_defaults() {
        let cli = Cli::try_parse_from(["reelplan", "reward", "p1", "0.5"]).unwrap();
        match cli.command {
            Commands::Reward {
                impressions,
                conversions,
                arms,
                mark_posted,
                ..
            } => {
                assert_eq!(impressions, 0);
                assert_eq!(conversions, 0);
                assert!(arms.is_empty());
                assert!(!mark_posted);
            }
            _ => panic!("Expected reward command"),
        }
    }

    #[test]
    fn test_help_works() {
        // Verify help doesn't panic
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["reelplan", "--version"]);
        // Version flag causes early exit with error (expected)
        assert!(result.is_err());
    }
}

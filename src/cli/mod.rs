//! CLI module for reelplan - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for plan assembly,
//! plan inspection, bandit stats, recovery status, and data ingestion.

pub mod commands;

pub use commands::Cli;

//! CLI Commands Module
//!
//! Command definitions for the dag-verifier CLI.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// DAG chain verifier
#[derive(Parser, Debug)]
#[command(name = "dag-verifier")]
#[command(author = "Rainbow City Foundation")]
#[command(version)]
#[command(about = "DAG chain continuity verifier")]
#[command(long_about = "Walks each tracked project's DAG chain through a rate limited \
    content store, reports height gaps, duplicate heights and stuck chains, and \
    posts the summary to a webhook.\n\n\
    Configuration comes from DAG_VERIFIER_* environment variables (a .env file is \
    loaded) or a JSON file; flags override both.")]
pub struct Cli {
    /// JSON configuration file (env: DAG_VERIFIER_CONFIG)
    #[arg(short, long, env = "DAG_VERIFIER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Content store address, multiaddr or URL
    #[arg(long)]
    pub store_url: Option<String>,

    /// Webhook URL for summaries
    #[arg(long)]
    pub webhook_url: Option<String>,

    /// Tracked projects, comma separated `id=cid` or `id`
    #[arg(short, long)]
    pub projects: Option<String>,

    /// Concurrent project walks
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Output format (json, table, plain)
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,

    /// Log format (pretty, json, compact)
    #[arg(long, default_value = "compact")]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Table format (human-readable)
    Table,
    /// Plain text
    Plain,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Table
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one verification pass and notify
    Run {
        /// Print the summary without posting it
        #[arg(long)]
        no_notify: bool,
    },

    /// Run verification passes periodically until interrupted
    Watch {
        /// Seconds between passes
        #[arg(short, long)]
        interval: Option<u64>,

        /// Print summaries without posting them
        #[arg(long)]
        no_notify: bool,
    },

    /// Convert a store multiaddr into an HTTP base URL
    NormalizeAddress {
        /// Address such as /dns/ipfs/tcp/5001
        address: String,
    },

    /// Show the effective configuration
    Config,
}

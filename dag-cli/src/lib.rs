//! dag-verifier CLI - Command Line Interface
//!
//! Runs DAG chain verification passes from the command line.
//!
//! # Usage
//!
//! ```text
//! dag-verifier [OPTIONS] <COMMAND>
//!
//! Commands:
//!   run                One verification pass, print and post the summary
//!   watch              Verify every interval until interrupted
//!   normalize-address  Convert a store multiaddr into an HTTP base URL
//!   config             Show the effective configuration
//!
//! Options:
//!   -c, --config <FILE>      JSON configuration file
//!       --store-url <ADDR>   Content store address
//!       --webhook-url <URL>  Webhook for summaries
//!   -p, --projects <LIST>    Tracked projects, `id=cid` or `id`
//!   -w, --workers <N>        Concurrent project walks
//!   -f, --format <FORMAT>    Output format (json, table, plain) [default: table]
//!       --log-format <FMT>   Log format (pretty, json, compact) [default: compact]
//!   -v, --verbose            Enable verbose output
//! ```
//!
//! # Examples
//!
//! ## One pass without notification
//! ```text
//! dag-verifier --projects "pair:0xabc=bafy...,pair:0xdef" run --no-notify
//! ```
//!
//! ## Periodic verification
//! ```text
//! DAG_VERIFIER_WEBHOOK_URL=https://hooks.example.com/... dag-verifier watch --interval 300
//! ```

pub mod commands;
pub mod error;
pub mod handler;
pub mod logging;
pub mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use error::{CliError, CliResult};

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

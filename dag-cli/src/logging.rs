//! Structured Logging
//!
//! Log output goes to stderr so `--format json` output on stdout stays
//! machine readable. `RUST_LOG` overrides the computed filter.

use serde::{Deserialize, Serialize};
use std::io;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{CliError, CliResult};

/// Log format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty-printed for development
    Pretty,
    /// JSON for log collectors
    Json,
    /// Compact single-line
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Compact
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Level for the verifier crates
    pub level: tracing::Level,
    /// Include source file/line
    pub include_source: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: tracing::Level::INFO,
            include_source: false,
        }
    }
}

impl LogConfig {
    pub fn new(format: LogFormat, verbose: bool) -> Self {
        Self {
            format,
            level: if verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            },
            include_source: verbose,
        }
    }

    /// Filter directives used when `RUST_LOG` is unset
    pub fn filter_directives(&self) -> String {
        let level = self.level.to_string().to_lowercase();
        ["dag_cli", "dag_verifier", "dag_core"]
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Install the global subscriber
pub fn init_logging(config: &LogConfig) -> CliResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.filter_directives())
            .map_err(|e| CliError::logging(e.to_string()))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_file(config.include_source)
                    .with_line_number(config.include_source),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_writer(io::stderr)
                    .with_file(config.include_source)
                    .with_line_number(config.include_source),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(io::stderr)
                    .with_file(config.include_source)
                    .with_line_number(config.include_source),
            )
            .try_init(),
    };

    result.map_err(|e| CliError::logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.level, tracing::Level::INFO);
    }

    #[test]
    fn test_verbose_filter() {
        let config = LogConfig::new(LogFormat::Json, true);
        assert_eq!(
            config.filter_directives(),
            "dag_cli=debug,dag_verifier=debug,dag_core=debug"
        );
        assert!(config.include_source);
    }
}

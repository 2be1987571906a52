//! Verifier Configuration
//!
//! Configuration for the content store, the notification webhook and the
//! verification schedule. Supports loading from environment variables with
//! the DAG_VERIFIER_ prefix or from a JSON file.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::time::Duration;

use dag_core::normalize_store_address;

use crate::error::{VerifierError, VerifierResult};
use crate::rate_limit::RateLimit;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "DAG_VERIFIER_";

/// Content store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store address, multiaddr or URL
    #[serde(default = "default_store_url")]
    pub url: String,
    /// Per-fetch timeout in seconds
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
    /// Sustained requests per second, -1 for unlimited
    #[serde(default = "default_requests_per_sec")]
    pub requests_per_sec: f64,
    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,
}

fn default_store_url() -> String {
    "/dns/ipfs/tcp/5001".to_string()
}

fn default_store_timeout() -> u64 {
    30
}

fn default_requests_per_sec() -> f64 {
    10.0
}

fn default_burst() -> u32 {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            timeout_secs: default_store_timeout(),
            requests_per_sec: default_requests_per_sec(),
            burst: default_burst(),
        }
    }
}

impl StoreConfig {
    pub fn rate_limit(&self) -> RateLimit {
        RateLimit::from_config(self.requests_per_sec, self.burst)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// HTTP base URL of the store
    pub fn base_url(&self) -> VerifierResult<String> {
        Ok(normalize_store_address(&self.url)?)
    }
}

/// Notification webhook configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL, notifications are skipped when unset
    #[serde(default)]
    pub url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,
    /// Maximum delivery attempts
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before a delayed retry, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_webhook_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_webhook_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl WebhookConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_enabled(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

/// A tracked project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project identifier
    pub id: String,
    /// Fixed head CID, resolved through the head API when unset
    #[serde(default)]
    pub head_cid: Option<String>,
}

impl ProjectConfig {
    /// Parse `id=cid` or a bare `id`
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }

        match entry.split_once('=') {
            Some((id, cid)) => {
                let id = id.trim();
                let cid = cid.trim();
                if id.is_empty() {
                    return None;
                }
                Some(Self {
                    id: id.to_string(),
                    head_cid: (!cid.is_empty()).then(|| cid.to_string()),
                })
            }
            None => Some(Self {
                id: entry.to_string(),
                head_cid: None,
            }),
        }
    }

    /// Parse a comma separated project list
    pub fn parse_list(list: &str) -> Vec<Self> {
        list.split(',').filter_map(Self::parse).collect()
    }
}

/// Verifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Content store
    #[serde(default)]
    pub store: StoreConfig,
    /// Notification webhook
    #[serde(default)]
    pub webhook: WebhookConfig,
    /// Tracked projects
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
    /// Audit protocol API used to resolve head CIDs
    #[serde(default)]
    pub head_api_url: Option<String>,
    /// Concurrent project walks
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Maximum nodes fetched per walk
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Seconds a head may stay unchanged before the chain is stuck
    #[serde(default = "default_stuck_threshold")]
    pub stuck_threshold_secs: u64,
    /// Deadline for one verification pass in seconds
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
    /// Seconds between passes in watch mode
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

fn default_worker_count() -> usize {
    8
}

fn default_max_depth() -> usize {
    10_000
}

fn default_stuck_threshold() -> u64 {
    1_800
}

fn default_run_timeout() -> u64 {
    300
}

fn default_interval() -> u64 {
    300
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            webhook: WebhookConfig::default(),
            projects: Vec::new(),
            head_api_url: None,
            worker_count: default_worker_count(),
            max_depth: default_max_depth(),
            stuck_threshold_secs: default_stuck_threshold(),
            run_timeout_secs: default_run_timeout(),
            interval_secs: default_interval(),
        }
    }
}

impl VerifierConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - DAG_VERIFIER_STORE_URL: Store address (multiaddr or URL)
    /// - DAG_VERIFIER_STORE_TIMEOUT: Fetch timeout in seconds
    /// - DAG_VERIFIER_STORE_RPS: Requests per second (-1 = unlimited)
    /// - DAG_VERIFIER_STORE_BURST: Rate limiter burst
    /// - DAG_VERIFIER_WEBHOOK_URL: Notification webhook (optional)
    /// - DAG_VERIFIER_WEBHOOK_TIMEOUT: Webhook timeout in seconds
    /// - DAG_VERIFIER_NOTIFY_MAX_ATTEMPTS: Delivery attempts
    /// - DAG_VERIFIER_NOTIFY_RETRY_DELAY_MS: Delay for delayed retries
    /// - DAG_VERIFIER_PROJECTS: Comma separated `id=cid` or `id` entries
    /// - DAG_VERIFIER_HEAD_API_URL: Head resolution API (optional)
    /// - DAG_VERIFIER_WORKERS: Concurrent project walks
    /// - DAG_VERIFIER_MAX_DEPTH: Maximum nodes per walk
    /// - DAG_VERIFIER_STUCK_THRESHOLD: Staleness window in seconds
    /// - DAG_VERIFIER_RUN_TIMEOUT: Pass deadline in seconds
    /// - DAG_VERIFIER_INTERVAL: Seconds between passes
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name)).filter(|v| !v.trim().is_empty())
        };
        let parsed = |name: &str| var(name).and_then(|s| s.trim().parse().ok());

        let store = StoreConfig {
            url: var("STORE_URL").unwrap_or_else(default_store_url),
            timeout_secs: parsed("STORE_TIMEOUT").unwrap_or_else(default_store_timeout),
            requests_per_sec: var("STORE_RPS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_else(default_requests_per_sec),
            burst: var("STORE_BURST")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_else(default_burst),
        };

        let webhook = WebhookConfig {
            url: var("WEBHOOK_URL"),
            timeout_secs: parsed("WEBHOOK_TIMEOUT").unwrap_or_else(default_webhook_timeout),
            max_attempts: var("NOTIFY_MAX_ATTEMPTS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_else(default_max_attempts),
            retry_delay_ms: parsed("NOTIFY_RETRY_DELAY_MS").unwrap_or_else(default_retry_delay_ms),
        };

        Self {
            store,
            webhook,
            projects: var("PROJECTS")
                .map(|s| ProjectConfig::parse_list(&s))
                .unwrap_or_default(),
            head_api_url: var("HEAD_API_URL"),
            worker_count: var("WORKERS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_else(default_worker_count),
            max_depth: var("MAX_DEPTH")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_else(default_max_depth),
            stuck_threshold_secs: parsed("STUCK_THRESHOLD").unwrap_or_else(default_stuck_threshold),
            run_timeout_secs: parsed("RUN_TIMEOUT").unwrap_or_else(default_run_timeout),
            interval_secs: parsed("INTERVAL").unwrap_or_else(default_interval),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> VerifierResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Create a development configuration (local store, short schedule)
    pub fn development() -> Self {
        Self {
            store: StoreConfig {
                url: "/ip4/127.0.0.1/tcp/5001".to_string(),
                timeout_secs: 5,
                requests_per_sec: -1.0,
                burst: 1,
            },
            webhook: WebhookConfig {
                url: None,
                timeout_secs: 5,
                max_attempts: 2,
                retry_delay_ms: 500,
            },
            projects: Vec::new(),
            head_api_url: Some("http://127.0.0.1:9000".to_string()),
            worker_count: 2,
            max_depth: 1_000,
            stuck_threshold_secs: 120,
            run_timeout_secs: 60,
            interval_secs: 30,
        }
    }

    /// Configured project ids in order
    pub fn project_ids(&self) -> Vec<String> {
        self.projects.iter().map(|p| p.id.clone()).collect()
    }

    pub fn stuck_threshold(&self) -> Duration {
        Duration::from_secs(self.stuck_threshold_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Reject settings a verification pass cannot run with
    pub fn validate(&self) -> VerifierResult<()> {
        if self.worker_count == 0 {
            return Err(config_error("worker_count must be at least 1"));
        }
        if self.max_depth == 0 {
            return Err(config_error("max_depth must be at least 1"));
        }
        if self.store.timeout_secs == 0 {
            return Err(config_error("store.timeout_secs must be at least 1"));
        }
        if self.webhook.max_attempts == 0 {
            return Err(config_error("webhook.max_attempts must be at least 1"));
        }
        if self.interval_secs == 0 {
            return Err(config_error("interval_secs must be at least 1"));
        }
        if let RateLimit::PerSecond {
            requests_per_second,
            burst,
        } = self.store.rate_limit()
        {
            if !requests_per_second.is_finite() || requests_per_second <= 0.0 {
                return Err(config_error(
                    "store.requests_per_sec must be positive or -1 for unlimited",
                ));
            }
            if burst == 0 {
                return Err(config_error("store.burst must be at least 1"));
            }
        }

        self.store.base_url()?;

        let mut seen = HashSet::new();
        for project in &self.projects {
            if project.id.trim().is_empty() {
                return Err(config_error("project id must not be empty"));
            }
            if !seen.insert(project.id.as_str()) {
                return Err(config_error(&format!("duplicate project id: {}", project.id)));
            }
        }

        Ok(())
    }
}

fn config_error(message: &str) -> VerifierError {
    VerifierError::Configuration(message.to_string())
}

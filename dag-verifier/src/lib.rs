//! DAG Verifier - Chain Walking and Notification
//!
//! Verifies every tracked project's DAG chain and reports the result to an
//! operator webhook.
//!
//! # Pipeline
//!
//! 1. Resolve each project's head CID ([`heads`])
//! 2. Walk `prevCid` links back through a rate limited content store
//!    ([`fetcher`], [`walker`])
//! 3. Detect gaps, duplicates and stuck heads per project (`dag_core`)
//! 4. Aggregate into one [`ChainSummary`](dag_core::ChainSummary) after all
//!    walks finish ([`runner`])
//! 5. Post the summary, retrying by response classification ([`notify`],
//!    [`retry`])
//!
//! [`monitor`] repeats the pipeline on an interval.
//!
//! # Usage
//!
//! ```ignore
//! use dag_verifier::{VerificationMonitor, VerifierConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = VerifierConfig::from_env();
//!     let handle = VerificationMonitor::from_config(&config)?.start();
//!
//!     tokio::signal::ctrl_c().await?;
//!     handle.stop().await;
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod heads;
pub mod monitor;
pub mod notify;
pub mod rate_limit;
pub mod retry;
pub mod runner;
pub mod store;
pub mod tracker;
pub mod walker;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use config::{ProjectConfig, StoreConfig, VerifierConfig, WebhookConfig};
pub use error::{FetchError, NotifyError, VerifierError, VerifierResult, WalkError};
pub use fetcher::RateLimitedFetcher;
pub use heads::{ApiHeadSource, HeadSource, LayeredHeadSource, StaticHeadSource};
pub use monitor::{MonitorHandle, PassOutcome, VerificationMonitor};
pub use notify::{classify, Attempt, NotificationDispatcher, Notifier, ResponseOutcome};
pub use rate_limit::{RateLimit, RateLimiter};
pub use retry::{deliver, DeliveryReport, RetryPolicy, RetryStrategy};
pub use runner::{ProjectReport, RunReport, VerificationRunner};
pub use store::{ContentStore, IpfsHttpStore, MemoryStore};
pub use tracker::{HeadTracker, TrackedHead};
pub use walker::{ChainWalker, WalkResult, WalkStop};

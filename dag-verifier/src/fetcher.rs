//! Rate Limited Fetcher
//!
//! Every store read first takes a token from the shared limiter. The token
//! wait and the read itself share one deadline.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::error::FetchError;
use crate::rate_limit::{RateLimit, RateLimiter};
use crate::store::ContentStore;

/// Content store access bounded by a token bucket and a per-call timeout
#[derive(Clone)]
pub struct RateLimitedFetcher {
    store: Arc<dyn ContentStore>,
    limiter: Arc<RateLimiter>,
    timeout: Duration,
}

impl RateLimitedFetcher {
    pub fn new(store: Arc<dyn ContentStore>, limit: RateLimit, timeout: Duration) -> Self {
        Self::with_limiter(store, Arc::new(RateLimiter::new(limit)), timeout)
    }

    /// Build around an existing limiter handle
    pub fn with_limiter(
        store: Arc<dyn ContentStore>,
        limiter: Arc<RateLimiter>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            limiter,
            timeout,
        }
    }

    /// Configured per-call timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Fetch the bytes stored under `cid`
    ///
    /// Fails with `RateLimitTimeout` if no token is available before the
    /// deadline, `Transport` if the read does not finish in time.
    pub async fn fetch(&self, cid: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let deadline = Instant::now() + timeout;
        self.limiter.acquire(deadline).await?;

        debug!(cid, store = self.store.name(), "Fetching node");
        match tokio::time::timeout_at(deadline, self.store.get(cid)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Transport(format!(
                "fetch of {} timed out after {:?}",
                cid, timeout
            ))),
        }
    }
}

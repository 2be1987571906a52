//! Store Rate Limiting
//!
//! Token bucket shared by every worker of a verification run. A token is
//! only taken once it is available, so a waiter dropped mid-sleep (run
//! cancellation) leaves the bucket as it found it.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::FetchError;

/// Rate limit setting for content store access
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLimit {
    /// Never wait
    Unlimited,
    /// Token bucket with sustained rate and burst capacity
    PerSecond { requests_per_second: f64, burst: u32 },
}

impl Default for RateLimit {
    fn default() -> Self {
        Self::PerSecond {
            requests_per_second: 10.0,
            burst: 10,
        }
    }
}

impl RateLimit {
    /// Build from configuration values, a negative rate meaning unlimited
    pub fn from_config(requests_per_second: f64, burst: u32) -> Self {
        if requests_per_second < 0.0 {
            Self::Unlimited
        } else {
            Self::PerSecond {
                requests_per_second,
                burst,
            }
        }
    }
}

const TOKEN_EPSILON: f64 = 1e-9;
const MIN_WAIT: Duration = Duration::from_millis(1);

/// Token bucket state
#[derive(Debug)]
struct TokenBucket {
    /// Available tokens, never negative
    tokens: f64,
    /// Last refill time
    last_refill: Instant,
    /// Maximum tokens (burst capacity)
    max_tokens: f64,
    /// Refill rate (tokens per second)
    refill_rate: f64,
}

impl TokenBucket {
    fn new(burst: u32, refill_rate: f64) -> Self {
        Self {
            tokens: burst as f64,
            last_refill: Instant::now(),
            max_tokens: burst as f64,
            refill_rate,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    /// Take one token if available, otherwise report how long until one is
    ///
    /// `None` means no token will ever arrive.
    fn try_take(&mut self, now: Instant) -> Result<(), Option<Duration>> {
        self.refill(now);

        // absorbs float drift from fractional refills
        if self.tokens >= 1.0 - TOKEN_EPSILON {
            self.tokens = (self.tokens - 1.0).max(0.0);
            return Ok(());
        }
        if self.refill_rate <= 0.0 {
            return Err(None);
        }

        let wait = Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate);
        Err(Some(wait.max(MIN_WAIT)))
    }
}

/// Shared rate limiter handle
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Option<Mutex<TokenBucket>>,
}

impl RateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        let bucket = match limit {
            RateLimit::Unlimited => None,
            RateLimit::PerSecond {
                requests_per_second,
                burst,
            } => Some(Mutex::new(TokenBucket::new(burst, requests_per_second))),
        };
        Self { bucket }
    }

    pub fn unlimited() -> Self {
        Self::new(RateLimit::Unlimited)
    }

    /// Wait for a token
    ///
    /// Fails with [`FetchError::RateLimitTimeout`] as soon as the next token
    /// is due after `deadline`, without sleeping first. Dropping the future
    /// while it waits consumes nothing.
    pub async fn acquire(&self, deadline: Instant) -> Result<(), FetchError> {
        let Some(bucket) = &self.bucket else {
            return Ok(());
        };

        loop {
            let ready_at = {
                let mut bucket = bucket.lock().await;
                let now = Instant::now();
                match bucket.try_take(now) {
                    Ok(()) => return Ok(()),
                    Err(None) => return Err(FetchError::RateLimitTimeout),
                    Err(Some(wait)) => now + wait,
                }
            };

            if ready_at > deadline {
                return Err(FetchError::RateLimitTimeout);
            }
            // another waiter may win the token, in which case we go round again
            tokio::time::sleep_until(ready_at).await;
        }
    }
}

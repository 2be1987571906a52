//! Notification Retry
//!
//! Drives repeated delivery attempts from the [`RetryDecision`] of each
//! attempt. Immediate retries do not sleep; delayed retries follow the
//! configured [`RetryStrategy`].

use std::time::Duration;
use tracing::{error, info, warn};

use dag_core::{ChainSummary, RetryDecision};

use crate::config::WebhookConfig;
use crate::error::NotifyError;
use crate::notify::Notifier;

/// Retry strategy
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// No delay
    None,
    /// Fixed delay between retries
    Fixed { delay_ms: u64 },
    /// Exponential backoff
    Exponential {
        initial_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
    },
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::Exponential {
            initial_delay_ms: 5_000,
            max_delay_ms: 50_000,
            multiplier: 2.0,
        }
    }
}

impl RetryStrategy {
    /// Calculate delay after the given attempt number (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            RetryStrategy::None => Duration::ZERO,
            RetryStrategy::Fixed { delay_ms } => Duration::from_millis(*delay_ms),
            RetryStrategy::Exponential {
                initial_delay_ms,
                max_delay_ms,
                multiplier,
            } => {
                let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
                let delay = (*initial_delay_ms as f64) * multiplier.powi(exponent);
                let delay = delay.min(*max_delay_ms as f64);
                Duration::from_millis(delay as u64)
            }
        }
    }
}

/// Attempt ceiling plus delay schedule
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub strategy: RetryStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            strategy: RetryStrategy::default(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, strategy: RetryStrategy) -> Self {
        Self {
            max_attempts,
            strategy,
        }
    }

    /// Exponential backoff from the configured delay, capped at ten times it
    pub fn from_config(config: &WebhookConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            strategy: RetryStrategy::Exponential {
                initial_delay_ms: config.retry_delay_ms,
                max_delay_ms: config.retry_delay_ms.saturating_mul(10),
                multiplier: 2.0,
            },
        }
    }
}

/// Successful delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Attempts made, including the successful one
    pub attempts: u32,
    /// Decision of every attempt in order
    pub decisions: Vec<RetryDecision>,
}

/// Deliver a summary, retrying as each attempt's decision dictates
///
/// Returns `Rejected` as soon as an attempt is classified as permanent and
/// `RetryExhausted` once `max_attempts` attempts have failed.
pub async fn deliver<N>(
    notifier: &N,
    summary: &ChainSummary,
    policy: &RetryPolicy,
) -> Result<DeliveryReport, NotifyError>
where
    N: Notifier + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut decisions = Vec::new();
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        let outcome = notifier.notify(summary).await;
        decisions.push(outcome.decision);

        match outcome.decision {
            RetryDecision::NoRetrySuccess => {
                info!(notifier = notifier.name(), attempt, "Summary delivered");
                return Ok(DeliveryReport {
                    attempts: attempt,
                    decisions,
                });
            }
            RetryDecision::NoRetryFailure => {
                error!(
                    notifier = notifier.name(),
                    attempt,
                    error = %outcome.detail,
                    "Summary rejected, not retrying"
                );
                return Err(NotifyError::Rejected(outcome.detail));
            }
            RetryDecision::RetryImmediate => {
                warn!(
                    notifier = notifier.name(),
                    attempt,
                    error = %outcome.detail,
                    "No response, retrying immediately"
                );
            }
            RetryDecision::RetryWithDelay => {
                let delay = policy.strategy.delay_for_attempt(attempt);
                warn!(
                    notifier = notifier.name(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %outcome.detail,
                    "Delivery failed, backing off"
                );
                if attempt < max_attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
        last_error = outcome.detail;
    }

    error!(
        notifier = notifier.name(),
        attempts = max_attempts,
        error = %last_error,
        "Summary delivery exhausted retries"
    );
    Err(NotifyError::RetryExhausted {
        attempts: max_attempts,
        last_error,
    })
}

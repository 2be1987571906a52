//! Notification wire types and retry classification

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::types::summary::ChainSummary;

/// Outcome of a single notification attempt
///
/// Closed set: every dispatch site matches it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryDecision {
    /// Delivered, nothing more to do
    NoRetrySuccess,
    /// No response received, retry right away
    RetryImmediate,
    /// Endpoint reported a transient error, back off before retrying
    RetryWithDelay,
    /// Endpoint reported a permanent error, give up
    NoRetryFailure,
}

impl RetryDecision {
    /// Whether the caller should attempt delivery again
    pub fn should_retry(&self) -> bool {
        match self {
            Self::RetryImmediate | Self::RetryWithDelay => true,
            Self::NoRetrySuccess | Self::NoRetryFailure => false,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::NoRetrySuccess)
    }
}

impl std::fmt::Display for RetryDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NoRetrySuccess => "no_retry_success",
            Self::RetryImmediate => "retry_immediate",
            Self::RetryWithDelay => "retry_with_delay",
            Self::NoRetryFailure => "no_retry_failure",
        };
        write!(f, "{}", name)
    }
}

/// Webhook request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyRequest {
    /// Serialized [`ChainSummary`]
    #[serde(rename = "dagChainSummary")]
    pub dag_chain_summary: String,
}

impl NotifyRequest {
    pub fn from_summary(summary: &ChainSummary) -> CoreResult<Self> {
        Ok(Self {
            dag_chain_summary: summary.to_json()?,
        })
    }
}

/// Extra response details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub messages: Vec<String>,
}

/// Webhook response body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub response_metadata: ResponseMetadata,
}

impl NotifyResponse {
    /// Error string, if the endpoint reported one
    pub fn error(&self) -> Option<&str> {
        let error = self.error.trim();
        if error.is_empty() {
            None
        } else {
            Some(error)
        }
    }
}

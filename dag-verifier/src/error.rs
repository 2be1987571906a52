//! Verifier Error Types
//!
//! Error definitions for fetching, walking and notification.

use dag_core::{AddressError, CoreError};
use thiserror::Error;

/// Content store fetch failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No rate limiter token became available before the deadline
    #[error("Rate limiter wait exceeded deadline")]
    RateLimitTimeout,

    /// Network or IO failure, including an elapsed request deadline
    #[error("Transport error: {0}")]
    Transport(String),

    /// Store has no content for the CID
    #[error("CID not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.to_string())
    }
}

/// Failure that truncated a chain walk
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalkError {
    /// Fetching a node failed
    #[error("Failed to fetch {cid}: {source}")]
    Fetch { cid: String, source: FetchError },

    /// A fetched node could not be decoded
    #[error("Failed to decode {cid}: {reason}")]
    Decode { cid: String, reason: String },
}

/// Notification delivery failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Endpoint rejected the notification permanently
    #[error("Notification rejected: {0}")]
    Rejected(String),

    /// Retry budget spent without success
    #[error("Notification failed after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },
}

/// Verifier Error
#[derive(Error, Debug)]
pub enum VerifierError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Store address error
    #[error("Invalid store address: {0}")]
    Address(#[from] AddressError),

    /// Head lookup error
    #[error("Head lookup failed for {project_id}: {reason}")]
    HeadSource { project_id: String, reason: String },

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Notification error
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerifierError {
    pub fn head_source(project_id: &str, reason: impl std::fmt::Display) -> Self {
        Self::HeadSource {
            project_id: project_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Verifier Result type
pub type VerifierResult<T> = Result<T, VerifierError>;

impl From<reqwest::Error> for VerifierError {
    fn from(e: reqwest::Error) -> Self {
        VerifierError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for VerifierError {
    fn from(e: serde_json::Error) -> Self {
        VerifierError::Serialization(e.to_string())
    }
}

impl From<CoreError> for VerifierError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Address(e) => VerifierError::Address(e),
            CoreError::Serialization(e) => VerifierError::Serialization(e.to_string()),
        }
    }
}

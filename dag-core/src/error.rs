//! Error types for DAG Core

use thiserror::Error;

/// DAG Core errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Store address normalization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Empty segment in store address: {0}")]
    EmptySegment(String),

    #[error("Unsupported protocol '{protocol}' in store address: {address}")]
    UnsupportedProtocol { protocol: String, address: String },

    #[error("Invalid port '{port}' in store address: {address}")]
    InvalidPort { port: String, address: String },

    #[error("Unrecognized store address: {0}")]
    Unrecognized(String),
}

/// Result type alias for DAG Core operations
pub type CoreResult<T> = Result<T, CoreError>;

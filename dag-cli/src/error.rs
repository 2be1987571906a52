//! CLI Error Types
//!
//! Error types for the dag-verifier command line.

use thiserror::Error;

use dag_core::AddressError;
use dag_verifier::{NotifyError, VerifierError};

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Logging setup failed
    #[error("Logging error: {message}")]
    LoggingError { message: String },

    /// Store address error
    #[error("Invalid address: {0}")]
    AddressError(#[from] AddressError),

    /// Verifier error
    #[error("Verifier error: {0}")]
    VerifierError(#[from] VerifierError),

    /// Notification delivery failed
    #[error("{0}")]
    NotifyError(#[from] NotifyError),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        CliError::ConfigError {
            message: message.into(),
        }
    }

    /// Create a logging error
    pub fn logging(message: impl Into<String>) -> Self {
        CliError::LoggingError {
            message: message.into(),
        }
    }

    /// Get exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::ConfigError { .. } => 1,
            CliError::LoggingError { .. } => 3,
            CliError::AddressError(_) => 4,
            CliError::IoError(_) => 5,
            CliError::JsonError(_) => 6,
            CliError::VerifierError(VerifierError::Configuration(_)) => 1,
            CliError::VerifierError(VerifierError::Address(_)) => 4,
            CliError::VerifierError(_) => 10,
            CliError::NotifyError(NotifyError::Rejected(_)) => 20,
            CliError::NotifyError(NotifyError::RetryExhausted { .. }) => 21,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("no projects configured");
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("no projects configured"));
    }

    #[test]
    fn test_verifier_configuration_maps_to_config_code() {
        let err: CliError = VerifierError::Configuration("worker_count".to_string()).into();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_notify_errors() {
        let rejected: CliError = NotifyError::Rejected("invalid_payload".to_string()).into();
        assert_eq!(rejected.exit_code(), 20);

        let exhausted: CliError = NotifyError::RetryExhausted {
            attempts: 3,
            last_error: "HTTP 503: busy".to_string(),
        }
        .into();
        assert_eq!(exhausted.exit_code(), 21);
        assert!(exhausted.to_string().contains("3 attempts"));
    }

    #[test]
    fn test_exit_codes_are_distinct_per_kind() {
        let errors: Vec<CliError> = vec![
            CliError::config("c"),
            CliError::logging("l"),
            AddressError::Unrecognized("/foo".to_string()).into(),
            std::io::Error::new(std::io::ErrorKind::Other, "io").into(),
            serde_json::from_str::<serde_json::Value>("{").unwrap_err().into(),
        ];
        let codes: Vec<i32> = errors.iter().map(CliError::exit_code).collect();
        assert_eq!(codes, vec![1, 3, 4, 5, 6]);
    }

    #[test]
    fn test_address_error() {
        let err: CliError = AddressError::Unrecognized("/foo".to_string()).into();
        assert_eq!(err.exit_code(), 4);
    }
}

//! Error types for the Gatekeeper service.

use thiserror::Error;

/// Main error type for Gatekeeper operations.
///
/// Admission checks never fail; these cover process setup and I/O.
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Target URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<::config::ConfigError> for GatekeeperError {
    fn from(err: ::config::ConfigError) -> Self {
        GatekeeperError::Config(err.to_string())
    }
}

/// Result type alias for Gatekeeper operations.
pub type Result<T> = std::result::Result<T, GatekeeperError>;

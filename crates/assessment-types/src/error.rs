//! Error types for shared configuration.

use thiserror::Error;

/// Configuration loading or validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

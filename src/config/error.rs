//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid timeout for {0}: must be at least one second")]
    InvalidTimeout(&'static str),

    #[error("Invalid max_tokens: must be positive")]
    InvalidMaxTokens,

    #[error("Rscript path cannot be empty")]
    EmptyRscriptPath,

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}

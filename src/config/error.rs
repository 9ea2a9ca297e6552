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

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Patch margin must be at least 1")]
    InvalidPatchMargin,

    #[error("Patch max_context must not be smaller than margin")]
    InvalidPatchContext,

    #[error("Patch max_body_chars must be positive")]
    InvalidBodyLimit,

    #[error("Resolution timeout must be between 1 and 60000 ms")]
    InvalidResolutionTimeout,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}

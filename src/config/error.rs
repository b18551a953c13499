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

    #[error("Invalid UTC offset '{0}', expected +HH:MM or -HH:MM")]
    InvalidOffset(String),

    #[error("Recurring period '{0}' must have an interval of at least 1")]
    InvalidPeriodInterval(String),

    #[error("Recurring period id '{0}' is reserved")]
    ReservedPeriodId(String),

    #[error("Order workflow state names must be distinct, '{0}' is used twice")]
    DuplicateWorkflowState(String),

    #[error("Invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,
}

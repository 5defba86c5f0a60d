//! Error types for the scheduling engine.

use thiserror::Error;

/// Main error type for scheduling operations.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by job/resource repositories.
///
/// A failed repository call during a conflict check must surface as
/// "status unknown" to callers, never as "no conflicts found".
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Result type alias for scheduling operations.
pub type Result<T> = std::result::Result<T, ScheduleError>;

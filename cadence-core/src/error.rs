//! Error types for the cadence ecosystem.

use thiserror::Error;

/// Errors that can occur in cadence operations.
#[derive(Error, Debug)]
pub enum CadenceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Occurrence not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for cadence operations.
pub type CadenceResult<T> = Result<T, CadenceError>;

//! Error types for the core library.

use thiserror::Error;

use crate::remote::RemoteError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted field could not be decoded.
    #[error("Malformed cache data: {0}")]
    MalformedCacheData(String),

    /// Remote catalog request failed.
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

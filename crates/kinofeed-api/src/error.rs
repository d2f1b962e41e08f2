//! Error types for catalog API operations.

/// Result type alias for catalog API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Catalog API error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure: DNS, refused connection, connect timeout, reset.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("API error: server responded with status {status_code}")]
    Api {
        /// HTTP status code returned by the server.
        status_code: u16,
    },

    /// The response body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The requested film does not exist on the server.
    #[error("Film not found: {0}")]
    NotFound(i64),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Returns `true` if the failure happened before a response arrived.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

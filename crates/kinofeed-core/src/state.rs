//! Observable per-query state consumed by the presentation layer.

use std::fmt;

use crate::Error;
use crate::remote::RemoteError;

/// Displayable error category attached to a [`UiState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport or connectivity failure.
    Network,
    /// Server answered with a failure status.
    Api {
        /// HTTP status code.
        status_code: u16,
    },
    /// Server payload had an unexpected shape.
    Decode,
    /// The film does not exist on the server.
    NotFound,
    /// A cached record could not be decoded.
    MalformedCacheData,
    /// The local database failed.
    Storage,
}

impl ErrorKind {
    /// User-facing message for this error.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Network => "No connection to the server",
            Self::Api { .. } => "The server could not handle the request",
            Self::Decode => "The server sent an unexpected response",
            Self::NotFound => "Film not found",
            Self::MalformedCacheData | Self::Storage => "Something went wrong",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api { status_code } => write!(f, "{} ({status_code})", self.message()),
            _ => f.write_str(self.message()),
        }
    }
}

impl From<&RemoteError> for ErrorKind {
    fn from(err: &RemoteError) -> Self {
        match err {
            RemoteError::Network(_) => Self::Network,
            RemoteError::Api { status_code } => Self::Api {
                status_code: *status_code,
            },
            RemoteError::Decode(_) => Self::Decode,
            RemoteError::NotFound => Self::NotFound,
        }
    }
}

impl From<&Error> for ErrorKind {
    fn from(err: &Error) -> Self {
        match err {
            Error::Remote(remote) => remote.into(),
            Error::MalformedCacheData(_) => Self::MalformedCacheData,
            Error::Database(_) | Error::Serde(_) | Error::Io(_) | Error::Config(_) => {
                Self::Storage
            }
        }
    }
}

/// Snapshot of one query: loading flag, error and data.
///
/// Error and data may coexist: a failed refresh keeps the cached data.
/// `loading` means a fetch is in flight, not that data is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState<T> {
    /// A fetch for this query is in flight.
    pub loading: bool,
    /// The last fetch failed.
    pub error: Option<ErrorKind>,
    /// Latest known value.
    pub data: Option<T>,
}

impl<T> Default for UiState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<T> UiState<T> {
    /// Nothing requested yet.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            loading: false,
            error: None,
            data: None,
        }
    }

    /// Fetch in flight, showing `data` meanwhile.
    #[must_use]
    pub const fn loading(data: Option<T>) -> Self {
        Self {
            loading: true,
            error: None,
            data,
        }
    }

    /// Fetch finished with fresh data.
    #[must_use]
    pub const fn success(data: T) -> Self {
        Self {
            loading: false,
            error: None,
            data: Some(data),
        }
    }

    /// Fetch failed; previously known data is kept.
    #[must_use]
    pub const fn failure(error: ErrorKind, data: Option<T>) -> Self {
        Self {
            loading: false,
            error: Some(error),
            data,
        }
    }

    /// Transforms the data, keeping loading and error flags.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> UiState<U> {
        UiState {
            loading: self.loading,
            error: self.error,
            data: self.data.map(f),
        }
    }

    /// A manual refresh should be offered.
    #[must_use]
    pub const fn can_retry(&self) -> bool {
        self.error.is_some() && !self.loading
    }
}

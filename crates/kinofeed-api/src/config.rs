//! Client configuration types.

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Public endpoint of the unofficial Kinopoisk API.
pub const DEFAULT_BASE_URL: &str = "https://kinopoiskapiunofficial.tech/";

/// Header carrying the static API credential.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Listing collection served by the `films/top` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Collection {
    /// The 100 currently most popular films.
    #[default]
    Popular,
    /// The all-time best 250 films.
    Best,
    /// Films awaiting release.
    Awaited,
}

impl Collection {
    /// Returns the `type` query parameter value for this collection.
    #[must_use]
    pub const fn as_query(self) -> &'static str {
        match self {
            Self::Popular => "TOP_100_POPULAR_FILMS",
            Self::Best => "TOP_250_BEST_FILMS",
            Self::Awaited => "TOP_AWAIT_FILMS",
        }
    }
}

/// Catalog client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API base URL. Always ends with `/`.
    pub base_url: Url,
    /// Static credential sent with every request.
    pub api_key: String,
    /// Listing collection requested by page fetches.
    pub collection: Collection,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout; `None` leaves reads unbounded.
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Creates a configuration for the public endpoint with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(api_key: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(api_key)
    }
}

/// Builder for client configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    base_url: String,
    api_key: String,
    collection: Collection,
    connect_timeout: Duration,
    request_timeout: Option<Duration>,
}

impl ConfigBuilder {
    /// Creates a new builder with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            collection: Collection::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: None,
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the listing collection.
    #[must_use]
    pub const fn collection(mut self, collection: Collection) -> Self {
        self.collection = collection;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the whole-request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is blank or the base URL does not parse.
    pub fn build(self) -> Result<Config> {
        let api_key = self.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(Error::InvalidConfig("API key must not be empty".into()));
        }

        let mut base = self.base_url;
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        Ok(Config {
            base_url,
            api_key,
            collection: self.collection,
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
        })
    }
}

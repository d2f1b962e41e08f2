//! Catalog HTTP client.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::{API_KEY_HEADER, Collection, Config};
use crate::error::{Error, Result};
use crate::types::{FilmDetails, FilmsPage};

/// Client for the listing and detail endpoints.
///
/// Every request carries the configured API key header. Failures are never
/// retried here; retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: reqwest::Client,
    base_url: Url,
    collection: Collection,
}

impl Client {
    /// Creates a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client cannot be constructed.
    pub fn new(config: Config) -> Result<Self> {
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| Error::InvalidConfig(format!("API key is not a valid header: {e}")))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| Error::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.base_url,
            collection: config.collection,
        })
    }

    /// Returns the base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches one 1-indexed page of the configured listing.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` on transport failure, `Error::Api` on a
    /// non-success status and `Error::Decode` on a malformed body.
    pub async fn fetch_page(&self, page: u32) -> Result<FilmsPage> {
        let mut url = self.base_url.join("api/v2.2/films/top")?;
        url.query_pairs_mut()
            .append_pair("type", self.collection.as_query())
            .append_pair("page", &page.to_string());

        debug!(page, %url, "Fetching listing page");
        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            warn!(page, status = status.as_u16(), "Listing request failed");
            return Err(Error::Api {
                status_code: status.as_u16(),
            });
        }

        let page_body: FilmsPage = decode(response).await?;
        debug!(
            page,
            items = page_body.films.len(),
            total = page_body.pages_count,
            "Listing page received"
        );
        Ok(page_body)
    }

    /// Fetches the full record for a film.
    ///
    /// # Errors
    ///
    /// Same as [`Client::fetch_page`], plus `Error::NotFound` when the server
    /// does not know the id.
    pub async fn fetch_film(&self, id: i64) -> Result<FilmDetails> {
        let url = self.base_url.join(&format!("api/v2.2/films/{id}"))?;

        debug!(id, %url, "Fetching film details");
        let response = self.get(url).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(Error::NotFound(id)),
            status if !status.is_success() => {
                warn!(id, status = status.as_u16(), "Details request failed");
                Err(Error::Api {
                    status_code: status.as_u16(),
                })
            }
            _ => decode(response).await,
        }
    }

    async fn get(&self, url: Url) -> Result<Response> {
        self.http_client
            .get(url)
            .send()
            .await
            .map_err(Error::Network)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await.map_err(Error::Network)?;
    serde_json::from_slice(&body).map_err(Error::Decode)
}

//! Remote catalog source.
//!
//! Bridges the repository with the `kinofeed-api` HTTP client and maps wire
//! records into domain models.

use async_trait::async_trait;
use kinofeed_api::{Client, FilmDetails, FilmListItem, FilmsPage};

use crate::model::{MovieId, MovieInfo, MovieSummary, Page};

/// Errors that can occur while talking to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Transport failure (timeout, DNS, refused connection).
    #[error("Network error: {0}")]
    Network(String),

    /// Server responded with a failure status.
    #[error("API error: status {status_code}")]
    Api {
        /// HTTP status code.
        status_code: u16,
    },

    /// Response payload had an unexpected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The film does not exist on the server.
    #[error("Film not found")]
    NotFound,
}

impl From<kinofeed_api::Error> for RemoteError {
    fn from(err: kinofeed_api::Error) -> Self {
        use kinofeed_api::Error as Api;

        match err {
            Api::Network(e) => Self::Network(e.to_string()),
            Api::Api { status_code } => Self::Api { status_code },
            Api::Decode(e) => Self::Decode(e.to_string()),
            Api::NotFound(_) => Self::NotFound,
            Api::InvalidConfig(msg) => Self::Network(msg),
            Api::Url(e) => Self::Network(e.to_string()),
        }
    }
}

/// A source of listing pages and film details.
#[async_trait]
pub trait MovieSource: Send + Sync {
    /// Fetch one 1-indexed listing page.
    async fn fetch_page(&self, page: u32) -> Result<Page, RemoteError>;

    /// Fetch a film's detail record.
    async fn fetch_info(&self, id: MovieId) -> Result<MovieInfo, RemoteError>;
}

#[async_trait]
impl MovieSource for Client {
    async fn fetch_page(&self, page: u32) -> Result<Page, RemoteError> {
        let body = Self::fetch_page(self, page).await?;
        Ok(page_from_wire(page, body))
    }

    async fn fetch_info(&self, id: MovieId) -> Result<MovieInfo, RemoteError> {
        let details = self.fetch_film(id.0).await?;
        Ok(info_from_wire(details))
    }
}

fn page_from_wire(number: u32, body: FilmsPage) -> Page {
    Page {
        number,
        total_pages: body.pages_count,
        items: body.films.into_iter().map(summary_from_wire).collect(),
    }
}

fn summary_from_wire(item: FilmListItem) -> MovieSummary {
    MovieSummary {
        id: MovieId(item.film_id),
        name_ru: item.name_ru,
        name_en: item.name_en,
        name_original: None,
        poster_url: item.poster_url,
        poster_url_preview: item.poster_url_preview,
        rating: item.rating,
        genres: item.genres.into_iter().map(|g| g.genre).collect(),
        countries: item.countries.into_iter().map(|c| c.country).collect(),
        year: item.year,
    }
}

fn info_from_wire(details: FilmDetails) -> MovieInfo {
    MovieInfo {
        summary: MovieSummary {
            id: MovieId(details.kinopoisk_id),
            name_ru: details.name_ru,
            name_en: details.name_en,
            name_original: details.name_original,
            poster_url: details.poster_url,
            poster_url_preview: details.poster_url_preview,
            rating: details.rating_kinopoisk,
            genres: details.genres.into_iter().map(|g| g.genre).collect(),
            countries: details.countries.into_iter().map(|c| c.country).collect(),
            year: details.year,
        },
        description: details.description,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kinofeed_api::{Country, Genre};

    use super::*;

    #[test]
    fn test_page_from_wire() {
        let body = FilmsPage {
            pages_count: 20,
            films: vec![FilmListItem {
                film_id: 5,
                name_ru: Some("Пять".into()),
                name_en: None,
                year: Some(2005),
                rating: Some(6.6),
                genres: vec![Genre {
                    genre: "драма".into(),
                }],
                countries: vec![Country {
                    country: "Франция".into(),
                }],
                poster_url: Some("https://example.com/5.jpg".into()),
                poster_url_preview: None,
            }],
        };

        let page = page_from_wire(3, body);
        assert_eq!(page.number, 3);
        assert_eq!(page.total_pages, 20);
        assert_eq!(page.items[0].id, MovieId(5));
        assert_eq!(page.items[0].genres, vec!["драма"]);
        assert_eq!(page.items[0].countries, vec!["Франция"]);
    }

    #[test]
    fn test_info_from_wire() {
        let details: FilmDetails = serde_json::from_str(
            r#"{"kinopoiskId": 9, "nameOriginal": "Nine", "description": "d",
                "ratingKinopoisk": 5.0, "genres": [{"genre": "ужасы"}]}"#,
        )
        .unwrap();

        let info = info_from_wire(details);
        assert_eq!(info.id(), MovieId(9));
        assert_eq!(info.display_name(), "Nine");
        assert_eq!(info.description.as_deref(), Some("d"));
        assert_eq!(info.summary.genres, vec!["ужасы"]);
    }

    #[test]
    fn test_error_translation() {
        assert_eq!(
            RemoteError::from(kinofeed_api::Error::Api { status_code: 402 }),
            RemoteError::Api { status_code: 402 }
        );
        assert_eq!(
            RemoteError::from(kinofeed_api::Error::NotFound(3)),
            RemoteError::NotFound
        );
        let decode = serde_json::from_str::<FilmsPage>("{").unwrap_err();
        assert!(matches!(
            RemoteError::from(kinofeed_api::Error::Decode(decode)),
            RemoteError::Decode(_)
        ));
    }
}

//! Wire types returned by the catalog endpoints.

use serde::{Deserialize, Deserializer, Serialize};

/// A genre tag as the API encodes it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Genre {
    /// Genre name.
    pub genre: String,
}

/// A production country as the API encodes it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Country {
    /// Country name.
    pub country: String,
}

/// One page of the `films/top` listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmsPage {
    /// Total number of pages in the listing.
    pub pages_count: u32,
    /// Films on this page, in server order.
    #[serde(default)]
    pub films: Vec<FilmListItem>,
}

/// A film as it appears in a listing page.
///
/// Year and rating arrive as strings (`"2023"`, `"8.1"`, `"null"`, `"97%"`)
/// and are parsed leniently.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmListItem {
    /// Kinopoisk film id.
    pub film_id: i64,
    /// Russian title.
    pub name_ru: Option<String>,
    /// English title.
    pub name_en: Option<String>,
    /// Release year.
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    /// Kinopoisk rating.
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rating: Option<f64>,
    /// Genres, most relevant first.
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Production countries.
    #[serde(default)]
    pub countries: Vec<Country>,
    /// Full-size poster.
    pub poster_url: Option<String>,
    /// Poster thumbnail.
    pub poster_url_preview: Option<String>,
}

/// Full film record from `films/{id}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmDetails {
    /// Kinopoisk film id.
    pub kinopoisk_id: i64,
    /// Russian title.
    pub name_ru: Option<String>,
    /// English title.
    pub name_en: Option<String>,
    /// Original-language title.
    pub name_original: Option<String>,
    /// Full-size poster.
    pub poster_url: Option<String>,
    /// Poster thumbnail.
    pub poster_url_preview: Option<String>,
    /// Kinopoisk rating.
    pub rating_kinopoisk: Option<f64>,
    /// Release year.
    pub year: Option<i32>,
    /// Long-form description.
    pub description: Option<String>,
    /// Genres, most relevant first.
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Production countries.
    #[serde(default)]
    pub countries: Vec<Country>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose<T> {
    Number(T),
    Text(String),
}

fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose<i32>>::deserialize(deserializer)? {
        Some(Loose::Number(year)) => Some(year),
        Some(Loose::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose<f64>>::deserialize(deserializer)? {
        Some(Loose::Number(rating)) => Some(rating),
        Some(Loose::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

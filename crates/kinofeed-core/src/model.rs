//! Film domain models.

use serde::{Deserialize, Serialize};

/// Shown when a film has no usable title.
pub const TITLE_PLACEHOLDER: &str = "—";

/// Unique identifier for a film (the Kinopoisk id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MovieId(pub i64);

impl MovieId {
    /// Create a new film ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A film as shown in a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    /// Film ID.
    pub id: MovieId,
    /// Primary (Russian) title.
    pub name_ru: Option<String>,
    /// English title.
    pub name_en: Option<String>,
    /// Original-language title.
    pub name_original: Option<String>,
    /// Full-size poster URL.
    pub poster_url: Option<String>,
    /// Thumbnail poster URL.
    pub poster_url_preview: Option<String>,
    /// Kinopoisk rating.
    pub rating: Option<f64>,
    /// Genres, most relevant first.
    pub genres: Vec<String>,
    /// Production countries.
    pub countries: Vec<String>,
    /// Release year.
    pub year: Option<i32>,
}

impl MovieSummary {
    /// Creates a summary with only an id set.
    #[must_use]
    pub const fn new(id: MovieId) -> Self {
        Self {
            id,
            name_ru: None,
            name_en: None,
            name_original: None,
            poster_url: None,
            poster_url_preview: None,
            rating: None,
            genres: Vec::new(),
            countries: Vec::new(),
            year: None,
        }
    }

    /// Best available title: primary, then English, then original.
    ///
    /// Blank titles are skipped. Falls back to [`TITLE_PLACEHOLDER`].
    #[must_use]
    pub fn display_name(&self) -> &str {
        [&self.name_ru, &self.name_en, &self.name_original]
            .into_iter()
            .flatten()
            .map(|name| name.trim())
            .find(|name| !name.is_empty())
            .unwrap_or(TITLE_PLACEHOLDER)
    }

    /// Short caption for list rows, e.g. `"Драма (2020)"`.
    #[must_use]
    pub fn subtitle(&self) -> String {
        let genre = self.genres.first().map(|g| capitalize(g));
        match (genre, self.year) {
            (Some(genre), Some(year)) => format!("{genre} ({year})"),
            (Some(genre), None) => genre,
            (None, Some(year)) => format!("({year})"),
            (None, None) => String::new(),
        }
    }

    /// Returns `true` if any title contains `query`, ignoring case.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        [&self.name_ru, &self.name_en, &self.name_original]
            .into_iter()
            .flatten()
            .any(|name| name.to_lowercase().contains(&query))
    }
}

/// Full film record: the listing fields plus a description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieInfo {
    /// Listing fields.
    pub summary: MovieSummary,
    /// Long-form description.
    pub description: Option<String>,
}

impl MovieInfo {
    /// Film ID.
    #[must_use]
    pub const fn id(&self) -> MovieId {
        self.summary.id
    }

    /// Best available title. See [`MovieSummary::display_name`].
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.summary.display_name()
    }
}

/// One 1-indexed page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number, starting at 1.
    pub number: u32,
    /// Total pages the server reported for the listing.
    pub total_pages: u32,
    /// Films in server order.
    pub items: Vec<MovieSummary>,
}

impl Page {
    /// Returns `true` if the listing continues after this page.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

//! Plain-text rendering of films.

use std::fmt::Write;

use kinofeed_core::{MovieInfo, MovieSummary};

/// One line per film: id, rating, title and caption.
pub fn film_row(film: &MovieSummary) -> String {
    let rating = film
        .rating
        .map_or_else(|| "  - ".to_string(), |rating| format!("{rating:>4.1}"));
    format!(
        "{:>9}  {rating}  {}  {}",
        film.id.0,
        film.display_name(),
        film.subtitle()
    )
}

/// Multi-line details block.
pub fn film_details(film: &MovieInfo) -> String {
    let summary = &film.summary;
    let mut out = String::new();

    let _ = writeln!(out, "{}", film.display_name());
    if let Some(original) = summary
        .name_original
        .as_deref()
        .filter(|name| *name != film.display_name())
    {
        let _ = writeln!(out, "  ({original})");
    }
    let _ = writeln!(out, "{}", summary.subtitle());
    if !summary.genres.is_empty() {
        let _ = writeln!(out, "Genres: {}", summary.genres.join(", "));
    }
    if !summary.countries.is_empty() {
        let _ = writeln!(out, "Countries: {}", summary.countries.join(", "));
    }
    if let Some(rating) = summary.rating {
        let _ = writeln!(out, "Rating: {rating:.1}");
    }
    if let Some(description) = &film.description {
        let _ = writeln!(out, "\n{description}");
    }
    out
}

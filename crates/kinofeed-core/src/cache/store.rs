//! Film cache storage.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;

use super::model::CacheEntry;
use crate::convert;
use crate::model::{MovieId, MovieInfo, MovieSummary, Page};
use crate::{Error, Result};

const SUMMARY_COLUMNS: &str = "f.id, f.name_ru, f.name_en, f.name_original, f.poster_url, \
     f.poster_url_preview, f.rating, f.genres, f.countries, f.year";

/// Persistent store for listing pages and film details.
///
/// Rows are keyed by film id. Page membership is kept separately as
/// `(page, position) -> film id`, so each page keeps its fetch order and
/// film records are never embedded in one another.
#[derive(Debug, Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Open the store at the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        // Listing rows (one per film id)
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS films (
                id INTEGER PRIMARY KEY,
                name_ru TEXT,
                name_en TEXT,
                name_original TEXT,
                poster_url TEXT,
                poster_url_preview TEXT,
                rating REAL,
                genres TEXT NOT NULL DEFAULT '[]',
                countries TEXT NOT NULL DEFAULT '[]',
                year INTEGER,
                cached_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Detail rows, fetched lazily per film
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS film_details (
                id INTEGER PRIMARY KEY,
                name_ru TEXT,
                name_en TEXT,
                name_original TEXT,
                poster_url TEXT,
                poster_url_preview TEXT,
                rating REAL,
                genres TEXT NOT NULL DEFAULT '[]',
                countries TEXT NOT NULL DEFAULT '[]',
                year INTEGER,
                description TEXT,
                cached_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS pages (
                page INTEGER PRIMARY KEY,
                total_pages INTEGER NOT NULL,
                cached_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS page_films (
                page INTEGER NOT NULL,
                position INTEGER NOT NULL,
                film_id INTEGER NOT NULL,
                PRIMARY KEY (page, position)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(r"CREATE INDEX IF NOT EXISTS idx_page_films_film ON page_films(film_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Replace a page's membership and upsert its films.
    ///
    /// The whole page is written in one transaction: readers see either the
    /// previous page or the new one, never a mix.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn upsert_summaries(&self, page: &Page) -> Result<()> {
        self.write_page(page, |_| Ok(())).await
    }

    /// Page write with a hook run after each film row; an error from the hook
    /// rolls the transaction back.
    async fn write_page<F>(&self, page: &Page, mut after_item: F) -> Result<()>
    where
        F: FnMut(usize) -> Result<()>,
    {
        let cached_at = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query(r"DELETE FROM page_films WHERE page = ?")
            .bind(page.number)
            .execute(&mut *tx)
            .await?;

        for (position, item) in page.items.iter().enumerate() {
            upsert_film(&mut tx, item, &cached_at).await?;

            sqlx::query(r"INSERT INTO page_films (page, position, film_id) VALUES (?, ?, ?)")
                .bind(page.number)
                .bind(i64::try_from(position).unwrap_or(i64::MAX))
                .bind(item.id.0)
                .execute(&mut *tx)
                .await?;

            after_item(position)?;
        }

        sqlx::query(
            r"
            INSERT INTO pages (page, total_pages, cached_at)
            VALUES (?, ?, ?)
            ON CONFLICT(page) DO UPDATE SET
                total_pages = excluded.total_pages,
                cached_at = excluded.cached_at
            ",
        )
        .bind(page.number)
        .bind(page.total_pages)
        .bind(&cached_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(page = page.number, items = page.items.len(), "Cached listing page");
        Ok(())
    }

    /// Upsert a film's detail record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn upsert_info(&self, info: &MovieInfo) -> Result<()> {
        let film = &info.summary;
        sqlx::query(
            r"
            INSERT INTO film_details
                (id, name_ru, name_en, name_original, poster_url, poster_url_preview,
                 rating, genres, countries, year, description, cached_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name_ru = excluded.name_ru,
                name_en = excluded.name_en,
                name_original = excluded.name_original,
                poster_url = excluded.poster_url,
                poster_url_preview = excluded.poster_url_preview,
                rating = excluded.rating,
                genres = excluded.genres,
                countries = excluded.countries,
                year = excluded.year,
                description = excluded.description,
                cached_at = excluded.cached_at
            ",
        )
        .bind(film.id.0)
        .bind(&film.name_ru)
        .bind(&film.name_en)
        .bind(&film.name_original)
        .bind(&film.poster_url)
        .bind(&film.poster_url_preview)
        .bind(film.rating)
        .bind(convert::encode(&film.genres))
        .bind(convert::encode(&film.countries))
        .bind(film.year)
        .bind(&info.description)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(id = %film.id, "Cached film details");
        Ok(())
    }

    /// Get a cached page in its original fetch order.
    ///
    /// Returns `None` if the page was never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row is malformed.
    pub async fn get_page(&self, page: u32) -> Result<Option<Vec<MovieSummary>>> {
        Ok(self.page_entry(page).await?.map(|entry| entry.value.items))
    }

    /// Get a cached page together with its metadata and timestamp.
    ///
    /// Metadata and items are read in one transaction, so both come from
    /// the same page write.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row is malformed.
    pub async fn page_entry(&self, page: u32) -> Result<Option<CacheEntry<Page>>> {
        let mut tx = self.pool.begin().await?;

        let Some(meta) = sqlx::query(r"SELECT total_pages, cached_at FROM pages WHERE page = ?")
            .bind(page)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let total_pages: u32 = meta.try_get("total_pages")?;
        let cached_at = parse_timestamp(&meta)?;

        let rows = sqlx::query(&format!(
            r"
            SELECT {SUMMARY_COLUMNS}
            FROM page_films p
            JOIN films f ON f.id = p.film_id
            WHERE p.page = ?
            ORDER BY p.position
            "
        ))
        .bind(page)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let items = rows.iter().map(row_to_summary).collect::<Result<Vec<_>>>()?;

        Ok(Some(CacheEntry {
            value: Page {
                number: page,
                total_pages,
                items,
            },
            cached_at,
        }))
    }

    /// Get a film's cached detail record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the row is malformed.
    pub async fn get_info(&self, id: MovieId) -> Result<Option<MovieInfo>> {
        Ok(self.info_entry(id).await?.map(|entry| entry.value))
    }

    /// Get a film's cached detail record with its timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the row is malformed.
    pub async fn info_entry(&self, id: MovieId) -> Result<Option<CacheEntry<MovieInfo>>> {
        let row = sqlx::query(
            r"
            SELECT f.id, f.name_ru, f.name_en, f.name_original, f.poster_url,
                   f.poster_url_preview, f.rating, f.genres, f.countries, f.year,
                   f.description, f.cached_at
            FROM film_details f
            WHERE f.id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<CacheEntry<MovieInfo>> {
            Ok(CacheEntry {
                value: MovieInfo {
                    summary: row_to_summary(&row)?,
                    description: row.try_get("description")?,
                },
                cached_at: parse_timestamp(&row)?,
            })
        })
        .transpose()
    }

    /// Highest cached page number, or 0 if nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn max_cached_page(&self) -> Result<u32> {
        let row = sqlx::query(r"SELECT MAX(page) AS max_page FROM pages")
            .fetch_one(&self.pool)
            .await?;

        let max_page: Option<u32> = row.try_get("max_page")?;
        Ok(max_page.unwrap_or(0))
    }

    /// Total page count most recently reported by the server, if any page is cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn total_pages(&self) -> Result<Option<u32>> {
        let row = sqlx::query(
            r"SELECT total_pages FROM pages ORDER BY cached_at DESC, page DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row.try_get("total_pages").map_err(Error::from))
            .transpose()
    }

    /// All cached listing films in page and position order.
    ///
    /// A film listed on several pages appears once, at its first position.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row is malformed.
    pub async fn listing(&self) -> Result<Vec<MovieSummary>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {SUMMARY_COLUMNS}
            FROM page_films p
            JOIN films f ON f.id = p.film_id
            ORDER BY p.page, p.position
            "
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut seen = HashSet::new();
        let mut films = Vec::with_capacity(rows.len());
        for row in &rows {
            let film = row_to_summary(row)?;
            if seen.insert(film.id) {
                films.push(film);
            }
        }
        Ok(films)
    }

    /// Search cached listing films by title, ignoring case.
    ///
    /// Matching runs in Rust because `SQLite`'s `LIKE` only folds ASCII case.
    /// Results follow listing order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row is malformed.
    pub async fn search(&self, query: &str) -> Result<Vec<MovieSummary>> {
        let mut films = self.listing().await?;
        films.retain(|film| film.matches(query));
        Ok(films)
    }
}

async fn upsert_film(
    tx: &mut Transaction<'_, Sqlite>,
    film: &MovieSummary,
    cached_at: &str,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO films
            (id, name_ru, name_en, name_original, poster_url, poster_url_preview,
             rating, genres, countries, year, cached_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name_ru = excluded.name_ru,
            name_en = excluded.name_en,
            name_original = excluded.name_original,
            poster_url = excluded.poster_url,
            poster_url_preview = excluded.poster_url_preview,
            rating = excluded.rating,
            genres = excluded.genres,
            countries = excluded.countries,
            year = excluded.year,
            cached_at = excluded.cached_at
        ",
    )
    .bind(film.id.0)
    .bind(&film.name_ru)
    .bind(&film.name_en)
    .bind(&film.name_original)
    .bind(&film.poster_url)
    .bind(&film.poster_url_preview)
    .bind(film.rating)
    .bind(convert::encode(&film.genres))
    .bind(convert::encode(&film.countries))
    .bind(film.year)
    .bind(cached_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn row_to_summary(row: &SqliteRow) -> Result<MovieSummary> {
    let genres: Option<String> = row.try_get("genres")?;
    let countries: Option<String> = row.try_get("countries")?;

    Ok(MovieSummary {
        id: MovieId(row.try_get("id")?),
        name_ru: row.try_get("name_ru")?,
        name_en: row.try_get("name_en")?,
        name_original: row.try_get("name_original")?,
        poster_url: row.try_get("poster_url")?,
        poster_url_preview: row.try_get("poster_url_preview")?,
        rating: row.try_get("rating")?,
        genres: convert::decode(genres.as_deref())?,
        countries: convert::decode(countries.as_deref())?,
        year: row.try_get("year")?,
    })
}

fn parse_timestamp(row: &SqliteRow) -> Result<DateTime<Utc>> {
    let cached_at: String = row.try_get("cached_at")?;
    DateTime::parse_from_rfc3339(&cached_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::MalformedCacheData(format!("cached_at {cached_at:?}: {e}")))
}

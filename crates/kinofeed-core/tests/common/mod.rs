//! Scripted film source shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use kinofeed_core::{
    EventAggregator, LocalStore, MovieId, MovieInfo, MovieRepository, MovieSource, MovieSummary,
    Page, RemoteError,
};

/// Id the source answers `NotFound` for.
pub const MISSING_ID: i64 = 404;

/// In-memory catalog with scripted pages, an offline switch and call counters.
pub struct FakeSource {
    pages: Vec<Vec<i64>>,
    delay: Duration,
    online: AtomicBool,
    panic_next: AtomicBool,
    page_calls: AtomicUsize,
    info_calls: AtomicUsize,
}

impl FakeSource {
    /// Source serving `pages[0]` as page 1 and so on.
    pub fn new(pages: Vec<Vec<i64>>) -> Self {
        Self {
            pages,
            delay: Duration::ZERO,
            online: AtomicBool::new(true),
            panic_next: AtomicBool::new(false),
            page_calls: AtomicUsize::new(0),
            info_calls: AtomicUsize::new(0),
        }
    }

    /// Delay every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make the next page fetch panic.
    pub fn with_panic_once(self) -> Self {
        self.panic_next.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<(), RemoteError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Network("connection refused".into()))
        }
    }
}

#[async_trait]
impl MovieSource for FakeSource {
    async fn fetch_page(&self, page: u32) -> Result<Page, RemoteError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("scripted failure for page {page}");
        }
        self.respond().await?;

        let ids = page
            .checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
            .ok_or(RemoteError::Api { status_code: 400 })?;

        Ok(Page {
            number: page,
            total_pages: u32::try_from(self.pages.len()).unwrap(),
            items: ids.iter().map(|&id| summary(id)).collect(),
        })
    }

    async fn fetch_info(&self, id: MovieId) -> Result<MovieInfo, RemoteError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;

        if id.0 == MISSING_ID {
            return Err(RemoteError::NotFound);
        }
        Ok(info(id.0))
    }
}

pub fn summary(id: i64) -> MovieSummary {
    MovieSummary {
        name_ru: Some(format!("Фильм {id}")),
        name_en: Some(format!("Film {id}")),
        genres: vec!["драма".into()],
        countries: vec!["Россия".into()],
        rating: Some(7.5),
        year: Some(2000),
        ..MovieSummary::new(MovieId(id))
    }
}

pub fn info(id: i64) -> MovieInfo {
    MovieInfo {
        summary: summary(id),
        description: Some(format!("Описание {id}")),
    }
}

/// Ids `start..start + count`.
pub fn ids(start: i64, count: i64) -> Vec<i64> {
    (start..start + count).collect()
}

/// Repository over an in-memory store and the given source.
pub async fn repository(source: FakeSource) -> (MovieRepository, Arc<FakeSource>) {
    let store = LocalStore::in_memory().await.unwrap();
    let source = Arc::new(source);
    let repo = MovieRepository::new(
        store,
        Arc::clone(&source) as Arc<dyn MovieSource>,
        Arc::new(EventAggregator::default()),
    );
    (repo, source)
}

pub fn item_ids(items: &[MovieSummary]) -> Vec<i64> {
    items.iter().map(|film| film.id.0).collect()
}

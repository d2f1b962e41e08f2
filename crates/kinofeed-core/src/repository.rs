//! Cache-first film repository.
//!
//! Every query (a listing page or a film id) is answered from the local
//! store first and refreshed from the remote source in the background:
//!
//! 1. emit `loading` with whatever is cached (possibly nothing);
//! 2. fetch from the source unless the policy says otherwise;
//! 3. on success write through to the store and emit the fresh value;
//! 4. on failure emit the error alongside the cached value, which is
//!    never cleared by a failed refresh.
//!
//! At most one fetch per key is in flight; concurrent requests for the same
//! page or film share it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, LocalStore};
use crate::events::{AppEvent, EventAggregator};
use crate::inflight::InFlight;
use crate::model::{MovieId, MovieInfo, MovieSummary, Page};
use crate::remote::MovieSource;
use crate::state::{ErrorKind, UiState};

/// Stream of states for one query. Ends after the final state.
pub type UiStream<T> = ReceiverStream<UiState<T>>;

/// How a query uses the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Emit the cached value, then always refresh from the network.
    #[default]
    CacheAndNetwork,
    /// Emit the cached value only; never touch the network.
    CacheOnly,
    /// Skip the network when the cached value is younger than the given age.
    CacheIfFresh(Duration),
}

/// Repository reconciling the remote catalog with the local store.
///
/// Cheap to clone; clones share the store, source and in-flight registry.
#[derive(Debug, Clone)]
pub struct MovieRepository {
    inner: Arc<Inner>,
}

struct Inner {
    store: LocalStore,
    source: Arc<dyn MovieSource>,
    events: Arc<EventAggregator>,
    pages_in_flight: InFlight<u32, Page>,
    info_in_flight: InFlight<MovieId, MovieInfo>,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("store", &self.store)
            .field("pages_in_flight", &self.pages_in_flight)
            .field("info_in_flight", &self.info_in_flight)
            .finish_non_exhaustive()
    }
}

impl MovieRepository {
    /// Create a repository over the given store and source.
    #[must_use]
    pub fn new(
        store: LocalStore,
        source: Arc<dyn MovieSource>,
        events: Arc<EventAggregator>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                source,
                events,
                pages_in_flight: InFlight::default(),
                info_in_flight: InFlight::default(),
            }),
        }
    }

    /// The underlying local store (read access for callers).
    #[must_use]
    pub fn store(&self) -> &LocalStore {
        &self.inner.store
    }

    /// Observe a listing page.
    ///
    /// The returned stream yields the cached state first and the refreshed
    /// state last. Dropping the stream does not cancel the fetch; the cache
    /// is still updated.
    #[must_use]
    pub fn page(&self, number: u32, policy: CachePolicy) -> UiStream<Page> {
        let (tx, rx) = mpsc::channel(4);
        let repo = self.clone();
        tokio::spawn(async move {
            let cached = repo.inner.store.page_entry(number).await;
            drive_query(&tx, policy, cached, || repo.fetch_page(number)).await;
        });
        ReceiverStream::new(rx)
    }

    /// Observe a film's details. See [`MovieRepository::page`].
    #[must_use]
    pub fn info(&self, id: MovieId, policy: CachePolicy) -> UiStream<MovieInfo> {
        let (tx, rx) = mpsc::channel(4);
        let repo = self.clone();
        tokio::spawn(async move {
            let cached = repo.inner.store.info_entry(id).await;
            drive_query(&tx, policy, cached, || repo.fetch_info(id)).await;
        });
        ReceiverStream::new(rx)
    }

    /// Fetch a page from the network and write it to the store.
    ///
    /// Joins an in-flight fetch of the same page if there is one.
    ///
    /// # Errors
    ///
    /// Returns the translated failure of the fetch or the store write.
    pub async fn fetch_page(&self, number: u32) -> Result<Page, ErrorKind> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .pages_in_flight
            .run(number, async move { inner.refresh_page(number).await })
            .await
    }

    /// Fetch a film's details from the network and write them to the store.
    ///
    /// Joins an in-flight fetch of the same film if there is one.
    ///
    /// # Errors
    ///
    /// Returns the translated failure of the fetch or the store write.
    pub async fn fetch_info(&self, id: MovieId) -> Result<MovieInfo, ErrorKind> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .info_in_flight
            .run(id, async move { inner.refresh_info(id).await })
            .await
    }

    /// Fetch the page after the highest cached one.
    ///
    /// Returns `Ok(None)` once the server-reported page count is reached.
    /// Concurrent calls for the same page share one network request.
    ///
    /// # Errors
    ///
    /// Returns the translated failure of the store lookup or the fetch.
    pub async fn load_next_page(&self) -> Result<Option<Page>, ErrorKind> {
        let store = &self.inner.store;
        let next = store.max_cached_page().await.map_err(|e| ErrorKind::from(&e))? + 1;

        if let Some(total) = store.total_pages().await.map_err(|e| ErrorKind::from(&e))?
            && next > total
        {
            debug!(next, total, "Listing exhausted");
            return Ok(None);
        }

        self.fetch_page(next).await.map(Some)
    }

    /// All cached listing films, pages concatenated in order.
    ///
    /// A film listed on several pages appears once.
    ///
    /// # Errors
    ///
    /// Returns the translated failure of the store lookup.
    pub async fn cached_listing(&self) -> Result<Vec<MovieSummary>, ErrorKind> {
        self.inner
            .store
            .listing()
            .await
            .map_err(|e| ErrorKind::from(&e))
    }

    /// Search cached listing films by title.
    ///
    /// # Errors
    ///
    /// Returns the translated failure of the store lookup.
    pub async fn search_cached(&self, query: &str) -> Result<Vec<MovieSummary>, ErrorKind> {
        self.inner
            .store
            .search(query)
            .await
            .map_err(|e| ErrorKind::from(&e))
    }

    /// Shared event bus.
    #[must_use]
    pub fn events(&self) -> &Arc<EventAggregator> {
        &self.inner.events
    }
}

impl Inner {
    async fn refresh_page(&self, number: u32) -> Result<Page, ErrorKind> {
        let page = self.source.fetch_page(number).await.map_err(|e| {
            warn!(page = number, error = %e, "Page fetch failed");
            ErrorKind::from(&e)
        })?;

        self.store.upsert_summaries(&page).await.map_err(|e| {
            warn!(page = number, error = %e, "Failed to cache page");
            ErrorKind::from(&e)
        })?;

        info!(page = number, items = page.items.len(), "Page refreshed");
        self.events.publish(AppEvent::PageCached { page: number });
        Ok(page)
    }

    async fn refresh_info(&self, id: MovieId) -> Result<MovieInfo, ErrorKind> {
        let info = self.source.fetch_info(id).await.map_err(|e| {
            warn!(%id, error = %e, "Film fetch failed");
            ErrorKind::from(&e)
        })?;

        self.store.upsert_info(&info).await.map_err(|e| {
            warn!(%id, error = %e, "Failed to cache film");
            ErrorKind::from(&e)
        })?;

        info!(%id, "Film refreshed");
        self.events.publish(AppEvent::InfoCached { id });
        Ok(info)
    }
}

/// Runs one query: cached state first, then the outcome of the refresh.
///
/// Send failures mean the subscriber went away; the refresh still runs so
/// the store is updated.
async fn drive_query<T, F, Fut>(
    tx: &mpsc::Sender<UiState<T>>,
    policy: CachePolicy,
    cached: crate::Result<Option<CacheEntry<T>>>,
    refresh: F,
) where
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ErrorKind>>,
{
    let (cached, cache_error) = match cached {
        Ok(entry) => (entry, None),
        Err(e) => {
            warn!(error = %e, "Cached value unreadable");
            (None, Some(ErrorKind::from(&e)))
        }
    };

    let use_network = match policy {
        CachePolicy::CacheAndNetwork => true,
        CachePolicy::CacheOnly => false,
        CachePolicy::CacheIfFresh(max_age) => {
            !cached.as_ref().is_some_and(|entry| entry.is_fresh(max_age))
        }
    };
    let data = cached.map(|entry| entry.value);

    if !use_network {
        let state = match cache_error {
            Some(kind) => UiState::failure(kind, None),
            None => UiState {
                loading: false,
                error: None,
                data,
            },
        };
        let _ = tx.send(state).await;
        return;
    }

    let _ = tx.send(UiState::loading(data.clone())).await;

    let state = match refresh().await {
        Ok(fresh) => UiState::success(fresh),
        Err(kind) => UiState::failure(kind, data),
    };
    let _ = tx.send(state).await;
}

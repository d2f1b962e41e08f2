//! Per-screen state holders.
//!
//! Each model owns a `watch` channel the presentation layer observes and
//! exposes plain async actions (load next page, refresh, load by id).

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::events::AppEvent;
use crate::model::{MovieId, MovieInfo, MovieSummary, Page};
use crate::repository::{CachePolicy, MovieRepository};
use crate::state::UiState;

/// Pages shown so far by a [`FilmListModel`].
#[derive(Debug, Default)]
struct ListProgress {
    pages_loaded: u32,
    total_pages: Option<u32>,
    items: Vec<MovieSummary>,
}

/// State holder for the featured films list.
///
/// Accumulates listing pages in order, dropping films already shown on an
/// earlier page. Refreshes itself when [`AppEvent::RefreshList`] is
/// published.
#[derive(Debug)]
pub struct FilmListModel {
    repo: MovieRepository,
    policy: CachePolicy,
    state: watch::Sender<UiState<Vec<MovieSummary>>>,
    progress: tokio::sync::Mutex<ListProgress>,
    listener: JoinHandle<()>,
}

impl FilmListModel {
    /// Create the model and start listening for list refresh events.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(repo: MovieRepository, policy: CachePolicy) -> Arc<Self> {
        let events = repo.events().subscribe();
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let listener = tokio::spawn(async move {
                let mut events = events;
                while let Some(event) = events.next().await {
                    if event != AppEvent::RefreshList {
                        continue;
                    }
                    let Some(model) = weak.upgrade() else { break };
                    debug!("Refreshing film list on request");
                    model.refresh().await;
                }
            });

            Self {
                repo,
                policy,
                state: watch::Sender::new(UiState::idle()),
                progress: tokio::sync::Mutex::new(ListProgress::default()),
                listener,
            }
        })
    }

    /// Observe the list state.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<UiState<Vec<MovieSummary>>> {
        self.state.subscribe()
    }

    /// Current list state.
    #[must_use]
    pub fn state(&self) -> UiState<Vec<MovieSummary>> {
        self.state.borrow().clone()
    }

    /// Show the next listing page below the ones already shown.
    ///
    /// Returns `false` without fetching once the last page is shown, and
    /// `false` if the page could not be obtained.
    pub async fn load_next_page(&self) -> bool {
        let mut progress = self.progress.lock().await;
        let next = progress.pages_loaded + 1;

        if progress.total_pages.is_some_and(|total| next > total) {
            debug!(next, "No more pages");
            return false;
        }

        self.show_page(&mut progress, next).await
    }

    /// Reload the list from its first page.
    ///
    /// Shown films stay visible until page one is available.
    pub async fn refresh(&self) {
        let mut progress = self.progress.lock().await;
        self.show_page(&mut progress, 1).await;
    }

    async fn show_page(&self, progress: &mut ListProgress, number: u32) -> bool {
        let base = if number == 1 {
            Vec::new()
        } else {
            progress.items.clone()
        };

        let mut states = self.repo.page(number, self.policy);
        let mut latest: Option<Page> = None;
        while let Some(state) = states.next().await {
            if let Some(page) = &state.data {
                latest = Some(page.clone());
            }
            let shown = progress.items.clone();
            let state = state
                .map(|page| merge(&base, page.items))
                .or_data(shown);
            self.state.send_replace(state);
        }

        let Some(page) = latest else {
            return false;
        };
        progress.items = merge(&base, page.items);
        progress.pages_loaded = number;
        progress.total_pages = Some(page.total_pages);
        true
    }
}

impl Drop for FilmListModel {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Appends `items` to `base`, skipping films already present.
fn merge(base: &[MovieSummary], items: Vec<MovieSummary>) -> Vec<MovieSummary> {
    let mut seen: HashSet<MovieId> = base.iter().map(|film| film.id).collect();
    let mut merged = base.to_vec();
    merged.extend(items.into_iter().filter(|film| seen.insert(film.id)));
    merged
}

impl<T> UiState<T> {
    fn or_data(mut self, fallback: T) -> Self {
        if self.data.is_none() {
            self.data = Some(fallback);
        }
        self
    }
}

/// State holder for the film details screen.
///
/// Loading a different film (or `None`) supersedes any load in progress:
/// states of the superseded load are no longer shown, although its fetch
/// still completes and updates the cache.
#[derive(Debug)]
pub struct FilmInfoModel {
    repo: MovieRepository,
    policy: CachePolicy,
    state: watch::Sender<UiState<MovieInfo>>,
    selection: Mutex<Selection>,
}

/// The film requested last, tagged with the load that requested it.
#[derive(Debug, Default, Clone, Copy)]
struct Selection {
    generation: u64,
    id: Option<MovieId>,
}

impl FilmInfoModel {
    /// Create an idle model.
    #[must_use]
    pub fn new(repo: MovieRepository, policy: CachePolicy) -> Self {
        Self {
            repo,
            policy,
            state: watch::Sender::new(UiState::idle()),
            selection: Mutex::new(Selection::default()),
        }
    }

    /// Observe the details state.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<UiState<MovieInfo>> {
        self.state.subscribe()
    }

    /// Current details state.
    #[must_use]
    pub fn state(&self) -> UiState<MovieInfo> {
        self.state.borrow().clone()
    }

    /// Film currently shown.
    #[must_use]
    pub fn current(&self) -> Option<MovieId> {
        self.selection().id
    }

    fn selection(&self) -> MutexGuard<'_, Selection> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Show the given film, or clear the screen with `None`.
    ///
    /// Resolves once the load has settled or been superseded.
    pub async fn load(&self, id: Option<MovieId>) {
        let generation = {
            let mut selection = self.selection();
            selection.generation += 1;
            selection.id = id;
            selection.generation
        };

        let Some(id) = id else {
            debug!("Clearing film details");
            self.show(generation, UiState::idle());
            return;
        };

        let mut states = self.repo.info(id, self.policy);
        while let Some(state) = states.next().await {
            if !self.show(generation, state) {
                debug!(%id, "Film load superseded");
                return;
            }
        }
    }

    /// Publishes `state` unless a later load has started.
    fn show(&self, generation: u64, state: UiState<MovieInfo>) -> bool {
        let mut state = Some(state);
        self.state.send_if_modified(|shown| {
            if self.selection().generation != generation {
                return false;
            }
            if let Some(state) = state.take() {
                *shown = state;
            }
            true
        })
    }

    /// Load the current film again.
    pub async fn retry(&self) {
        if let Some(id) = self.current() {
            self.load(Some(id)).await;
        }
    }
}

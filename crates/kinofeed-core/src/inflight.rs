//! Per-key registry of in-flight fetches.
//!
//! The first caller for a key starts the fetch on its own task; callers
//! arriving while it runs attach to the same result. Because the fetch is
//! spawned, it runs to completion (and writes the cache) even if every
//! caller stops waiting. The key is released however the task ends, so a
//! panicking fetch does not block later attempts.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, error};

use crate::state::ErrorKind;

type SharedFetch<T> = Shared<BoxFuture<'static, Result<T, ErrorKind>>>;

/// Registry deduplicating concurrent fetches for the same key.
pub struct InFlight<K, T> {
    fetches: Arc<Mutex<HashMap<K, SharedFetch<T>>>>,
}

impl<K, T> Default for InFlight<K, T> {
    fn default() -> Self {
        Self {
            fetches: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, T> std::fmt::Debug for InFlight<K, T>
where
    K: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fetches = lock(&self.fetches);
        f.debug_struct("InFlight")
            .field("keys", &fetches.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K, T> InFlight<K, T>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Await the fetch for `key`, starting `fetch` only if none is running.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn run<F>(&self, key: K, fetch: F) -> Result<T, ErrorKind>
    where
        F: Future<Output = Result<T, ErrorKind>> + Send + 'static,
    {
        self.join_or_start(key, fetch).await
    }

    fn join_or_start<F>(&self, key: K, fetch: F) -> SharedFetch<T>
    where
        F: Future<Output = Result<T, ErrorKind>> + Send + 'static,
    {
        let mut fetches = lock(&self.fetches);
        if let Some(existing) = fetches.get(&key) {
            debug!(?key, "Joining in-flight fetch");
            return existing.clone();
        }

        let release = Release {
            fetches: Arc::clone(&self.fetches),
            key: Some(key.clone()),
        };
        let handle = tokio::spawn(async move {
            let _release = release;
            fetch.await
        });

        let shared = async move {
            handle.await.unwrap_or_else(|e| {
                error!(error = %e, "Fetch task did not complete");
                Err(ErrorKind::Storage)
            })
        }
        .boxed()
        .shared();

        fetches.insert(key, shared.clone());
        shared
    }

    /// Number of fetches currently running.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.fetches).len()
    }

    /// Returns `true` if nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes its key from the registry when the fetch task finishes,
/// panics or is aborted.
struct Release<K: Eq + Hash, T> {
    fetches: Arc<Mutex<HashMap<K, SharedFetch<T>>>>,
    key: Option<K>,
}

impl<K: Eq + Hash, T> Drop for Release<K, T> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            lock(&self.fetches).remove(&key);
        }
    }
}

fn lock<M>(mutex: &Mutex<M>) -> MutexGuard<'_, M> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//! Cache data models.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// A cached value together with the time it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The cached value.
    pub value: T,
    /// When the value was cached.
    pub cached_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Time elapsed since the value was cached. Zero if the clock went back.
    #[must_use]
    pub fn age(&self) -> Duration {
        (Utc::now() - self.cached_at).to_std().unwrap_or_default()
    }

    /// Returns `true` if the entry is younger than `max_age`.
    #[must_use]
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        self.age() < max_age
    }

    /// Maps the cached value, keeping the timestamp.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheEntry<U> {
        CacheEntry {
            value: f(self.value),
            cached_at: self.cached_at,
        }
    }
}

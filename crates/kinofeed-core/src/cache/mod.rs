//! Local film cache.
//!
//! Persists listing pages and film details in `SQLite` so previously seen
//! data is available immediately and while offline.

mod model;
mod store;

pub use model::CacheEntry;
pub use store::LocalStore;

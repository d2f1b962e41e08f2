//! # kinofeed-core
//!
//! Data access for the kinofeed featured films browser.
//!
//! This crate provides:
//! - Domain models with display-name fallbacks
//! - Local film cache (`SQLite`)
//! - Remote source abstraction over the catalog client
//! - **Cache-first repository** - cached data immediately, network refresh
//!   in the background, one fetch per page or film at a time
//! - **Event bus** - cross-screen notifications
//! - **State holders** - observable list and details state for the UI

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod convert;
mod error;
pub mod events;
mod inflight;
pub mod model;
pub mod remote;
pub mod repository;
pub mod screen;
pub mod settings;
pub mod state;

pub use cache::{CacheEntry, LocalStore};
pub use error::{Error, Result};
pub use events::{AppEvent, EventAggregator, EventStream};
pub use model::{MovieId, MovieInfo, MovieSummary, Page};
pub use remote::{MovieSource, RemoteError};
pub use repository::{CachePolicy, MovieRepository, UiStream};
pub use screen::{FilmInfoModel, FilmListModel};
pub use settings::Settings;
pub use state::{ErrorKind, UiState};

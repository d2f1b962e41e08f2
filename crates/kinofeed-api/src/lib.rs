//! # kinofeed-api
//!
//! Client for the unofficial Kinopoisk catalog API.
//!
//! ## Features
//!
//! - **Listing pages**: 1-indexed pages of a film collection with the
//!   server-reported page count
//! - **Film details**: full record per film id
//! - **Static authentication**: the API key header is attached to every
//!   request by the underlying HTTP client
//! - **Typed failures**: transport, status, decode and not-found errors are
//!   distinct variants
//!
//! ## Quick Start
//!
//! ```ignore
//! use kinofeed_api::{Client, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(Config::new("your_api_key")?)?;
//!
//!     let page = client.fetch_page(1).await?;
//!     println!("{} films, {} pages", page.films.len(), page.pages_count);
//!
//!     let film = client.fetch_film(page.films[0].film_id).await?;
//!     println!("{:?}", film.description);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
pub mod config;
mod error;
pub mod types;

pub use client::Client;
pub use config::{Collection, Config, ConfigBuilder};
pub use error::{Error, Result};
pub use types::{Country, FilmDetails, FilmListItem, FilmsPage, Genre};

//! `kinofeed` - featured films browser
//!
//! Headless front end over the cache-first film repository: drives the list
//! and details state holders and prints what a screen would show.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use kinofeed_core::{
    CachePolicy, EventAggregator, FilmInfoModel, FilmListModel, LocalStore, MovieId, MovieInfo,
    MovieRepository, MovieSource, Page, RemoteError, Settings,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "kinofeed", version, about = "Browse featured films from Kinopoisk")]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Never contact the catalog; show cached data only
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List featured films
    List {
        /// Number of pages to show
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show a film's details
    Info {
        /// Kinopoisk film id
        id: i64,
    },
    /// Search cached films by title
    Search {
        /// Text to look for in any title
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kinofeed=info,kinofeed_core=info,kinofeed_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load().await.context("Failed to load settings")?;
    if let Some(path) = cli.database {
        settings.database_path = Some(path);
    }

    let repo = open_repository(&settings, cli.offline).await?;
    let policy = if cli.offline {
        CachePolicy::CacheOnly
    } else {
        CachePolicy::CacheAndNetwork
    };

    match cli.command {
        Command::List { pages } => list(repo, policy, pages).await,
        Command::Info { id } => show_info(repo, policy, MovieId::new(id)).await,
        Command::Search { query } => search(&repo, &query).await,
    }
}

async fn open_repository(settings: &Settings, offline: bool) -> anyhow::Result<MovieRepository> {
    let database_path = settings.database_path();
    if let Some(parent) = database_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let store = LocalStore::new(&database_path.to_string_lossy())
        .await
        .context("Failed to open film cache")?;
    info!("Film cache at {:?}", database_path);

    let source: Arc<dyn MovieSource> = if offline {
        Arc::new(Offline)
    } else {
        let config = settings
            .client_config()
            .context("Catalog client is not configured")?;
        Arc::new(kinofeed_api::Client::new(config)?)
    };

    Ok(MovieRepository::new(
        store,
        source,
        Arc::new(EventAggregator::default()),
    ))
}

async fn list(repo: MovieRepository, policy: CachePolicy, pages: u32) -> anyhow::Result<()> {
    let model = FilmListModel::new(repo, policy);
    for _ in 0..pages {
        if !model.load_next_page().await {
            break;
        }
    }

    let state = model.state();
    if let Some(error) = state.error {
        warn!("Showing cached films: {error}");
    }
    let films = state.data.unwrap_or_default();
    if films.is_empty() {
        println!("No films to show");
    }
    for film in &films {
        println!("{}", output::film_row(film));
    }
    Ok(())
}

async fn show_info(repo: MovieRepository, policy: CachePolicy, id: MovieId) -> anyhow::Result<()> {
    let model = FilmInfoModel::new(repo, policy);
    model.load(Some(id)).await;

    let state = model.state();
    match (state.data, state.error) {
        (Some(film), error) => {
            if let Some(error) = error {
                warn!("Showing cached details: {error}");
            }
            print!("{}", output::film_details(&film));
            Ok(())
        }
        (None, Some(error)) => anyhow::bail!("{error}"),
        (None, None) => {
            println!("Film {id} is not cached");
            Ok(())
        }
    }
}

async fn search(repo: &MovieRepository, query: &str) -> anyhow::Result<()> {
    let films = repo.search_cached(query).await.map_err(anyhow::Error::msg)?;
    if films.is_empty() {
        println!("Nothing cached matches {query:?}");
    }
    for film in &films {
        println!("{}", output::film_row(film));
    }
    Ok(())
}

/// Source used with `--offline`; every request fails as unreachable.
struct Offline;

#[async_trait]
impl MovieSource for Offline {
    async fn fetch_page(&self, _page: u32) -> Result<Page, RemoteError> {
        Err(RemoteError::Network("offline mode".into()))
    }

    async fn fetch_info(&self, _id: MovieId) -> Result<MovieInfo, RemoteError> {
        Err(RemoteError::Network("offline mode".into()))
    }
}

//! Application settings persisted as JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

/// Application directory name under the platform config/data dirs.
pub const APP_DIR: &str = "kinofeed";

/// Environment variable overriding the configured API key.
pub const API_KEY_ENV: &str = "KINOFEED_API_KEY";

/// Settings that persist across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Catalog API key sent as a static header.
    pub api_key: String,
    /// Catalog base URL.
    pub base_url: String,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds; unset leaves reads unbounded.
    pub request_timeout_secs: Option<u64>,
    /// Database file; defaults to the platform data dir.
    pub database_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: kinofeed_api::config::DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: kinofeed_api::config::DEFAULT_CONNECT_TIMEOUT.as_secs(),
            request_timeout_secs: None,
            database_path: None,
        }
    }
}

impl Settings {
    /// Default settings file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("settings.json")
    }

    /// Load settings from the default location, then apply the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        let mut settings = Self::load_from(&Self::default_path()).await?;
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            debug!("Using API key from {API_KEY_ENV}");
            settings.api_key = key;
        }
        Ok(settings)
    }

    /// Load settings from a file; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            debug!(?path, "No settings file, using defaults");
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save settings to a file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// Reject settings the client cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the API key is blank or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config(format!(
                "API key is not set (settings.json or {API_KEY_ENV})"
            )));
        }
        if self.connect_timeout_secs == 0 {
            return Err(Error::Config("connect timeout must be positive".into()));
        }
        Ok(())
    }

    /// Database file to open.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("kinofeed.db")
        })
    }

    /// Build the catalog client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid.
    pub fn client_config(&self) -> Result<kinofeed_api::Config> {
        self.validate()?;
        kinofeed_api::Config::builder(&self.api_key)
            .base_url(&self.base_url)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .request_timeout(self.request_timeout_secs.map(Duration::from_secs))
            .build()
            .map_err(|e| Error::Config(e.to_string()))
    }
}

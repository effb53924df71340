//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! backend location, how credentials are presented, where the session
//! mirror lives, and the last used username.
//!
//! Configuration is stored at `~/.config/learnhub/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{FileStore, KeyValueStore, KeyringStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "learnhub";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Session mirror file name in the data directory
const SESSION_FILE: &str = "session.json";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// 30s allows for slow API responses while failing fast enough for good UX.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Matches the backend's default token lifetime.
const DEFAULT_TOKEN_TTL_HOURS: i64 = 10;

/// How the credential is presented in the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// `Authorization: Token <credential>`
    #[default]
    Token,
    /// `Authorization: Bearer <credential>`
    Bearer,
}

impl AuthScheme {
    pub fn header_value(&self, credential: &str) -> String {
        match self {
            AuthScheme::Token => format!("Token {}", credential),
            AuthScheme::Bearer => format!("Bearer {}", credential),
        }
    }
}

/// Where the persisted session mirror lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub auth_scheme: AuthScheme,
    pub storage: StorageBackend,
    pub request_timeout_secs: u64,
    /// `None` disables local expiry of persisted sessions
    pub token_ttl_hours: Option<i64>,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_scheme: AuthScheme::default(),
            storage: StorageBackend::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_ttl_hours: Some(DEFAULT_TOKEN_TTL_HOURS),
            last_username: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Local lifetime of persisted sessions. Negative or out-of-range
    /// values fall back to the default.
    pub fn token_ttl(&self) -> Option<chrono::Duration> {
        let hours = self.token_ttl_hours?;
        match chrono::Duration::try_hours(hours) {
            Some(ttl) if hours >= 0 => Some(ttl),
            _ => {
                warn!(hours, "Invalid token_ttl_hours, using default");
                chrono::Duration::try_hours(DEFAULT_TOKEN_TTL_HOURS)
            }
        }
    }

    /// Open the persisted mirror selected by `storage`.
    pub fn open_storage(&self) -> Result<Arc<dyn KeyValueStore>> {
        Ok(match self.storage {
            StorageBackend::File => Arc::new(FileStore::new(self.data_dir()?.join(SESSION_FILE))),
            StorageBackend::Keyring => Arc::new(KeyringStore::default()),
        })
    }
}

//! Application configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the server URL, request timeout, credential backend, and the
//! last email used to log in.
//!
//! Configuration is stored at `~/.config/tourney/config.json`. A few fields
//! can be overridden from the environment (see [`Config::apply_env`]).

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::auth::{CredentialStore, FileStore, KeyringStore, MemoryStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "tourney";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// HTTP request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding `api_base_url`
pub const ENV_API_URL: &str = "TOURNEY_API_URL";

/// Environment variable overriding `store`
pub const ENV_STORE: &str = "TOURNEY_STORE";

/// Where credentials are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Keyring,
    File,
    Memory,
}

impl StoreBackend {
    pub fn open(&self) -> Result<Arc<dyn CredentialStore>> {
        Ok(match self {
            StoreBackend::Keyring => Arc::new(KeyringStore::new()),
            StoreBackend::File => Arc::new(FileStore::in_data_dir()?),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        })
    }
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyring" => Ok(StoreBackend::Keyring),
            "file" => Ok(StoreBackend::File),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown credential store: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Treat access tokens expiring within this many seconds as expired.
    /// Zero refreshes only after the server rejects a token.
    pub refresh_skew_secs: i64,
    pub store: StoreBackend,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            refresh_skew_secs: 0,
            store: StoreBackend::default(),
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `TOURNEY_API_URL` and `TOURNEY_STORE` overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_STORE).ok(),
        )
    }

    fn apply_overrides(&mut self, api_url: Option<String>, store: Option<String>) -> Result<()> {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(store) = store {
            self.store = store.parse()?;
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

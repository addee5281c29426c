//! Client configuration.
//!
//! Reads `~/.config/paperchat/config.toml` when present; every field has a
//! default so a missing file is not an error. `PAPERCHAT_BASE_URL`
//! overrides the configured base URL.

use paperchat_core::{ChatError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

const DEFAULT_BASE_URL: &str = "http://localhost:8001";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the remote document service.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, applying env overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Ok(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        if let Ok(base_url) = env::var("PAPERCHAT_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    /// Parses a config file.
    fn from_file(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ChatError::config(format!(
                "Failed to read configuration file at {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ChatError::config(format!("Failed to parse configuration: {e}")))
    }

    /// Returns the path to the configuration file:
    /// `~/.config/paperchat/config.toml`
    fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ChatError::config("Could not determine home directory"))?;
        Ok(home.join(".config").join("paperchat").join("config.toml"))
    }
}

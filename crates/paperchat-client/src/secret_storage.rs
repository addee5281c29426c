//! Secret configuration file storage.
//!
//! Persists the bearer token between CLI runs at
//! `~/.config/paperchat/secret.json`. Written on login, deleted on logout.
//!
//! # Security Note
//!
//! This is plaintext JSON storage; the file should carry restrictive
//! permissions (e.g. 600). No encryption is applied.

use paperchat_core::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Contents of secret.json.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretConfig {
    /// Bearer token obtained from the `/token` endpoint.
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Storage for the secret configuration file.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    /// Creates storage at the default path
    /// (`~/.config/paperchat/secret.json`).
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| ChatError::config("Could not determine home directory"))?;
        Ok(Self {
            path: home.join(".config").join("paperchat").join("secret.json"),
        })
    }

    /// Creates storage with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the secret configuration.
    ///
    /// A missing file yields the default (no token) rather than an error,
    /// so a fresh install behaves like a logged-out one.
    pub fn load(&self) -> Result<SecretConfig> {
        if !self.path.exists() {
            return Ok(SecretConfig::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            ChatError::config(format!(
                "Failed to read secret file at {}: {}",
                self.path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ChatError::config(format!(
                "Failed to parse secret file at {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Writes the secret configuration, creating parent directories.
    pub fn save(&self, config: &SecretConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ChatError::config(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        let content = serde_json::to_string_pretty(config)
            .map_err(|e| ChatError::internal(format!("Failed to serialize secret: {e}")))?;
        fs::write(&self.path, content).map_err(|e| {
            ChatError::config(format!(
                "Failed to write secret file at {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Removes the secret file (logout). Missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ChatError::config(format!(
                "Failed to remove secret file at {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Returns the path to the secret file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

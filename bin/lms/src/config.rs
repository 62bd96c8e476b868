//! Client-side connection settings.
//!
//! Reads/writes `~/.openlms/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Client configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server connection.
    #[serde(default)]
    pub server: ServerConfig,

    /// Persisted session location.
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server URL (e.g. "http://localhost:5000").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session file path (default: ~/.openlms/session.json).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
}

impl ClientConfig {
    /// Default config file path: ~/.openlms/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to disk.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolved session file path.
    pub fn session_path(&self) -> PathBuf {
        if self.session.file.is_empty() {
            dirs_path().join("session.json")
        } else {
            PathBuf::from(&self.session.file)
        }
    }

    /// Server URL, or an actionable error when none is configured.
    pub fn require_server(&self) -> anyhow::Result<&str> {
        if self.server.url.is_empty() {
            anyhow::bail!("No server URL configured. Run `lms server set <url>`.");
        }
        Ok(&self.server.url)
    }
}

/// Return the OpenLMS config directory (~/.openlms).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".openlms")
}

//! Configuration loading and persistence.
//!
//! Configuration lives in `config.json` inside the config directory.
//! Precedence, lowest to highest: defaults, file, environment variables,
//! command-line flags (applied by `main`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_SERVER_URL;

const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "pairchat.log";

/// Configuration for the pairchat client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// WebSocket URL of the chat relay.
    pub server_url: String,
    /// Participant id the relay knows us by. A random id is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            uid: None,
        }
    }
}

impl Config {
    /// Returns the configuration directory, creating it if necessary.
    ///
    /// `PAIRCHAT_CONFIG_DIR` overrides the platform config directory.
    pub fn config_dir() -> Result<PathBuf> {
        let dir = if let Ok(dir) = std::env::var("PAIRCHAT_CONFIG_DIR") {
            PathBuf::from(dir)
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("pairchat")
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        Ok(dir)
    }

    /// Path of the log file: `PAIRCHAT_LOG_FILE`, else next to the config.
    pub fn log_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("PAIRCHAT_LOG_FILE") {
            return Ok(PathBuf::from(path));
        }
        Ok(Self::config_dir()?.join(LOG_FILE))
    }

    /// Load configuration from the config directory with environment
    /// overrides applied. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_dir(&Self::config_dir()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load `config.json` from `dir`, falling back to defaults if absent.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Apply `PAIRCHAT_SERVER_URL` and `PAIRCHAT_UID` from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(server_url) = lookup("PAIRCHAT_SERVER_URL") {
            self.server_url = server_url;
        }
        if let Some(uid) = lookup("PAIRCHAT_UID").filter(|uid| !uid.is_empty()) {
            self.uid = Some(uid);
        }
    }

    /// Persist the configuration to `config.json` in `dir`.
    pub fn save_to_dir(&self, dir: &Path) -> Result<()> {
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Participant id for this run.
    ///
    /// Uses the configured uid when set. Otherwise a fresh UUID is generated
    /// and, when `persist` is true, written to `config.json` in `dir` so the
    /// next run keeps the same id. Only the uid is added to the stored file;
    /// environment overrides are not written back.
    pub fn resolve_local_id(&mut self, dir: &Path, persist: bool) -> Result<String> {
        if let Some(uid) = &self.uid {
            return Ok(uid.clone());
        }

        let uid = uuid::Uuid::new_v4().to_string();
        if persist {
            let mut stored = Self::load_from_dir(dir)?;
            stored.uid = Some(uid.clone());
            stored.save_to_dir(dir)?;
            log::info!("Saved new participant id {uid}");
        }
        self.uid = Some(uid.clone());
        Ok(uid)
    }
}

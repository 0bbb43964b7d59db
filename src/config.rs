//! User configuration, read from `~/.recapture/config.yaml`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_LOG_FILE, DEFAULT_TIMEOUT_SECS};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Request timeout; 0 disables it
    pub timeout_secs: u64,
    /// When true, ignores TLS certificate errors (useful for testing environments)
    pub accept_invalid_certs: bool,
    /// User-Agent the transport adds when a request carries none
    pub user_agent: Option<String>,
    /// Log file; relative paths resolve against the config directory
    pub log_file: PathBuf,
    /// Re-indent JSON bodies imported from fetch snippets
    pub pretty_fetch_body: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            accept_invalid_certs: false,
            user_agent: None,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            pretty_fetch_body: false,
        }
    }
}

impl Config {
    /// `~/.recapture`, or `./.recapture` without a home directory
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE_NAME)
    }

    /// Load from `path`. A missing file yields defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Absolute log file path
    pub fn log_path(&self, config_dir: &Path) -> PathBuf {
        if self.log_file.is_absolute() {
            self.log_file.clone()
        } else {
            config_dir.join(&self.log_file)
        }
    }
}

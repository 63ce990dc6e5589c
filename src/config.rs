//! User configuration (`~/.config/dlwatch/config.toml`)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::monitor::MonitorSettings;

pub const APP_DIR_NAME: &str = "dlwatch";
const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("could not determine the user config directory")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    /// Where fetched artifacts are written. Defaults to the user's download dir.
    pub download_dir: Option<PathBuf>,
    /// Fetch the artifact as soon as the job announces it. On by default.
    pub auto_fetch: bool,
    pub monitor: MonitorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".to_string(),
            download_dir: None,
            auto_fetch: true,
            monitor: MonitorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub max_logs: usize,
    pub flush_interval_ms: u64,
    pub stop_grace_ms: u64,
    pub hide_delay_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let defaults = MonitorSettings::default();
        Self {
            max_logs: defaults.max_logs,
            flush_interval_ms: defaults.flush_interval.as_millis() as u64,
            stop_grace_ms: defaults.stop_grace.as_millis() as u64,
            hide_delay_ms: defaults.hide_delay.as_millis() as u64,
        }
    }
}

impl MonitorConfig {
    pub fn settings(&self) -> MonitorSettings {
        MonitorSettings {
            max_logs: self.max_logs.max(1),
            flush_interval: Duration::from_millis(self.flush_interval_ms.max(1)),
            stop_grace: Duration::from_millis(self.stop_grace_ms),
            hide_delay: Duration::from_millis(self.hide_delay_ms),
        }
    }
}

impl Config {
    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join(APP_DIR_NAME).join(CONFIG_FILE))
}

/// Directory for the session cookie and the TUI log file.
pub fn state_dir() -> Result<PathBuf> {
    let dir = dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join(APP_DIR_NAME))
}

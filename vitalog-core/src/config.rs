//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/vitalog/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/vitalog/` (~/.config/vitalog/)
//! - Data: `$XDG_DATA_HOME/vitalog/` (~/.local/share/vitalog/)
//! - State/Logs: `$XDG_STATE_HOME/vitalog/` (~/.local/state/vitalog/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Background poller configuration
    #[serde(default)]
    pub pollers: PollersConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Background poller configuration
///
/// Pollers (music, gaming, weather) run on a shared interval loop and write
/// plain events to the store. Disabled by default: the webhook ingest path
/// works without them.
#[derive(Debug, Deserialize, Clone)]
pub struct PollersConfig {
    /// Enable/disable the background poller loop
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between poll rounds
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
}

impl Default for PollersConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_poll_interval(),
        }
    }
}

impl PollersConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.interval_secs == 0 {
            return Err(Error::Config(
                "pollers.interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_poll_interval() -> u64 {
    60
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.pollers.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/vitalog/config.toml` (~/.config/vitalog/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("vitalog").join("config.toml")
    }

    /// Returns the data directory path (for the SQLite event store)
    ///
    /// `$XDG_DATA_HOME/vitalog/` (~/.local/share/vitalog/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("vitalog")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/vitalog/` (~/.local/state/vitalog/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("vitalog")
    }

    /// Returns the event store file path
    ///
    /// `$XDG_DATA_HOME/vitalog/events.db` (~/.local/share/vitalog/events.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("events.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/vitalog/vitalog.log` (~/.local/state/vitalog/vitalog.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("vitalog.log")
    }
}

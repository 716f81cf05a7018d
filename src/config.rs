//! Configuration file parser.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Every key is individually defaulted, so any subset can be specified.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the SQLite cache file.
    pub database_path: String,

    /// Base URL of the external feed-fetch service.
    pub fetch_endpoint: String,

    /// Per-request timeout for the fetch service, in seconds.
    pub fetch_timeout_secs: u64,

    /// Articles published more than this many days ago are eligible for the
    /// retention sweep. 0 disables sweeping.
    pub retention_days: u32,

    /// Default page size for article list pagination.
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "feedstash.db".to_string(),
            fetch_endpoint: String::new(),
            fetch_timeout_secs: 30,
            retention_days: 0,
            page_size: 20,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB); anything larger is rejected unread.
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

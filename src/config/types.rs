//! Core configuration types and loading.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::{
    default_db_path, default_listen_address, default_log_format, default_preamble_timeout,
    default_privacy_mode,
};
use crate::state::PrivacyMode;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Room daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Room identity and metrics.
    pub server: ServerConfig,
    /// Listener configuration.
    #[serde(default)]
    pub listen: ListenConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Room policy defaults.
    #[serde(default)]
    pub room: RoomConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Room identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Room name, shown in `room.manifest`.
    pub name: String,
    /// The room's own identity (`@<base64>.<algo>`). Connections from it get
    /// the master handler set.
    pub identity: String,
    /// Prometheus metrics HTTP port. 0 or absent disables the endpoint.
    pub metrics_port: Option<u16>,
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind.
    #[serde(default = "default_listen_address")]
    pub address: SocketAddr,
    /// Seconds a new connection has to send its `PEER` preamble.
    #[serde(default = "default_preamble_timeout")]
    pub preamble_timeout: u64,
}

impl ListenConfig {
    pub fn preamble_timeout(&self) -> Duration {
        Duration::from_secs(self.preamble_timeout)
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_listen_address(),
            preamble_timeout: default_preamble_timeout(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file, or `:memory:`.
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Room policy defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomConfig {
    /// Privacy mode used when the database has none persisted yet.
    #[serde(default = "default_privacy_mode")]
    pub privacy_mode: PrivacyMode,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            privacy_mode: default_privacy_mode(),
        }
    }
}

//! Configuration schema and loading.
//!
//! All types derive Serde traits for deserialization from TOML files.
//! Every field has a default, so a partial file (or none at all) is
//! valid.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Root configuration for the echo server binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    /// Listening endpoint settings.
    pub listen: ListenConfig,

    /// Logging settings.
    pub log: LogConfig,
}

/// Listening endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Service string to resolve and bind (e.g. "127.0.0.1:7000").
    pub service: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            service: "127.0.0.1:7000".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Tracing env-filter directive used when RUST_LOG is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "acceptor=info".to_string(),
        }
    }
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("config read failed: {0}")]
    Io(#[from] std::io::Error),

    /// The config file was not valid TOML for the schema.
    #[error("config parse failed: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}

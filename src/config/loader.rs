use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::RuntimeConfig;

/// Upper bound for queue capacity, payload size and field count.
const MAX_LIMIT: usize = 65_536;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl RuntimeConfig {
    /// Returns the path to the configuration file.
    ///
    /// `EMBERCORE_CONFIG` wins when set. Otherwise uses
    /// `~/.config/embercore/config.toml` on Unix/macOS, or the equivalent
    /// via `dirs::config_dir()`, falling back to the current directory.
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os("EMBERCORE_CONFIG") {
            return PathBuf::from(path);
        }
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("embercore").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// - If the file doesn't exist, returns `RuntimeConfig::default()`.
    /// - Otherwise parses and validates it.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(RuntimeConfig::default());
        }

        Self::load_from(&path)
    }

    /// Loads and validates configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: RuntimeConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - Queue capacity is between 1 and 65536
    /// - Max payload length does not exceed 65536
    /// - Tracker covers between 1 and 65536 fields
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.capacity == 0 || self.queue.capacity > MAX_LIMIT {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "queue.capacity must be between 1 and {}, got {}",
                    MAX_LIMIT, self.queue.capacity
                ),
            });
        }

        if self.queue.max_payload_len > MAX_LIMIT {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "queue.max_payload_len must not exceed {}, got {}",
                    MAX_LIMIT, self.queue.max_payload_len
                ),
            });
        }

        if self.tracker.max_fields == 0 || self.tracker.max_fields > MAX_LIMIT {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "tracker.max_fields must be between 1 and {}, got {}",
                    MAX_LIMIT, self.tracker.max_fields
                ),
            });
        }

        Ok(())
    }
}

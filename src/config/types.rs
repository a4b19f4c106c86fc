use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Event queue sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of pending events (default: 256).
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
    /// Maximum event payload size in bytes, for both dispatch and enqueue (default: 256).
    #[serde(default = "default_max_payload_len")]
    pub max_payload_len: usize,
}

/// Dirty tracker sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Number of field ids the bitmap covers; ids at or above are out of range (default: 64).
    #[serde(default = "default_max_fields")]
    pub max_fields: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset (default: "info").
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_queue_capacity() -> usize {
    256
}

fn default_max_payload_len() -> usize {
    256
}

fn default_max_fields() -> usize {
    64
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            max_payload_len: default_max_payload_len(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_fields: default_max_fields(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            queue: QueueConfig::default(),
            tracker: TrackerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

//! Runtime configuration.
//!
//! Loaded once at `ember_init` from TOML. Every field has a default, so a
//! missing file or a partial one is valid.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{LoggingConfig, QueueConfig, RuntimeConfig, TrackerConfig};

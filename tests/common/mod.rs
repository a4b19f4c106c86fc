//! Shared test utilities.

#![allow(dead_code, unused_imports)]

use std::path::PathBuf;

use embercore::config::RuntimeConfig;
use embercore::demo::{self, DemoState};
use embercore::Runtime;
use tempfile::TempDir;

/// Runtime with the demo reducers and default config.
pub fn demo_runtime() -> Runtime {
    Runtime::with_defaults()
}

pub fn demo_runtime_with(config: RuntimeConfig) -> Runtime {
    Runtime::with_initial_state(&config, demo::registry(), demo::initial_state())
}

/// Demo runtime whose queue holds at most `capacity` events.
pub fn demo_runtime_with_capacity(capacity: usize) -> Runtime {
    let mut config = RuntimeConfig::default();
    config.queue.capacity = capacity;
    demo_runtime_with(config)
}

/// Decoded demo state of the runtime.
pub fn app_state(runtime: &Runtime) -> DemoState {
    DemoState::decode(runtime.state().payload).expect("demo payload decodes")
}

/// Todo texts in list order.
pub fn todo_texts(runtime: &Runtime) -> Vec<String> {
    app_state(runtime).todos.into_iter().map(|t| t.text).collect()
}

/// Write `content` to a temporary file named `name`.
pub fn temp_file(name: &str, content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write temp file");
    (temp_dir, path)
}

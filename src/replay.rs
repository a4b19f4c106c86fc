//! Scripted event replay against an owned runtime.
//!
//! Lets shell developers exercise reducers without a UI. A script is a
//! TOML list of steps:
//!
//! ```toml
//! [[steps]]
//! op = "queue"
//! event = "todo_add"
//! text = "Buy milk"
//! priority = 1
//!
//! [[steps]]
//! op = "process"
//! max = 10
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::demo::events;
use crate::event::{EventType, Priority};
use crate::runtime::Runtime;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read script '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse script '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Step {step}: {message}")]
    InvalidStep { step: usize, message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Dispatch {
        event: EventRef,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        value: Option<u32>,
    },
    Queue {
        event: EventRef,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        value: Option<u32>,
        #[serde(default = "default_priority")]
        priority: u8,
    },
    Process {
        #[serde(default = "default_max")]
        max: u32,
    },
    Clear,
}

fn default_priority() -> u8 {
    Priority::NORMAL.0
}

fn default_max() -> u32 {
    u32::MAX
}

/// An event code, either numeric or by name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EventRef {
    Code(u32),
    Name(String),
}

impl EventRef {
    pub fn resolve(&self) -> Option<u32> {
        match self {
            EventRef::Code(code) => Some(*code),
            EventRef::Name(name) => event_by_name(name),
        }
    }
}

fn event_by_name(name: &str) -> Option<u32> {
    let code = match name {
        "app_init" => EventType::AppInit.raw(),
        "app_terminate" => EventType::AppTerminate.raw(),
        "app_foreground" => EventType::AppForeground.raw(),
        "app_background" => EventType::AppBackground.raw(),
        "app_low_memory" => EventType::AppLowMemory.raw(),
        "button_press" => EventType::ButtonPress.raw(),
        "text_input" => EventType::TextInput.raw(),
        "text_commit" => EventType::TextCommit.raw(),
        "navigate" => EventType::Navigate.raw(),
        "navigate_back" => EventType::NavigateBack.raw(),
        "counter_increment" => EventType::CounterIncrement.raw(),
        "counter_decrement" => EventType::CounterDecrement.raw(),
        "counter_reset" => EventType::CounterReset.raw(),
        "todo_add" => events::TODO_ADD,
        "todo_toggle" => events::TODO_TOGGLE,
        "todo_remove" => events::TODO_REMOVE,
        "todo_toggle_all" => events::TODO_TOGGLE_ALL,
        "todo_clear_completed" => events::TODO_CLEAR_COMPLETED,
        "todo_set_filter" => events::TODO_SET_FILTER,
        _ => return None,
    };
    Some(code)
}

impl Script {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = fs::read_to_string(path).map_err(|e| ScriptError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let script: Script = toml::from_str(&content).map_err(|e| ScriptError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        script.validate()?;
        Ok(script)
    }

    /// Checks that every event resolves and no step carries two payloads.
    pub fn validate(&self) -> Result<(), ScriptError> {
        for (i, step) in self.steps.iter().enumerate() {
            let step_no = i + 1;
            if let Step::Dispatch { event, text, value } | Step::Queue { event, text, value, .. } = step {
                if event.resolve().is_none() {
                    return Err(ScriptError::InvalidStep {
                        step: step_no,
                        message: format!("unknown event name {:?}", event),
                    });
                }
                if text.is_some() && value.is_some() {
                    return Err(ScriptError::InvalidStep {
                        step: step_no,
                        message: "use either `text` or `value`, not both".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn payload_of(text: &Option<String>, value: &Option<u32>) -> Vec<u8> {
    match (text, value) {
        (Some(text), _) => text.as_bytes().to_vec(),
        (None, Some(value)) => value.to_le_bytes().to_vec(),
        (None, None) => Vec::new(),
    }
}

/// Observable state after one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub op: &'static str,
    pub error: Option<String>,
    pub processed: Option<u32>,
    pub version: u64,
    pub counter: i64,
    pub queue_depth: usize,
    pub changed: Vec<u16>,
}

/// Run every step in order. Failing steps are reported, not fatal.
pub fn run(script: &Script, runtime: &mut Runtime) -> Vec<StepOutcome> {
    script
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let (op, processed, error) = match step {
                Step::Dispatch { event, text, value } => {
                    let code = event.resolve().unwrap_or(u32::MAX);
                    let result = runtime.dispatch(code, &payload_of(text, value));
                    ("dispatch", None, result.err().map(|e| e.to_string()))
                }
                Step::Queue {
                    event,
                    text,
                    value,
                    priority,
                } => {
                    let code = event.resolve().unwrap_or(u32::MAX);
                    let result = runtime.queue_event(code, &payload_of(text, value), *priority);
                    ("queue", None, result.err().map(|e| e.to_string()))
                }
                Step::Process { max } => {
                    let report = runtime.process_events(*max);
                    ("process", Some(report.processed), report.last_error)
                }
                Step::Clear => {
                    runtime.queue_clear();
                    ("clear", None, None)
                }
            };
            StepOutcome {
                step: i + 1,
                op,
                error,
                processed,
                version: runtime.version(),
                counter: runtime.counter(),
                queue_depth: runtime.queue_depth(),
                changed: runtime.changed_fields().iter().collect(),
            }
        })
        .collect()
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{:<3} {:<8} v{:<4} counter={:<4} queue={:<3} changed={:?}",
            self.step, self.op, self.version, self.counter, self.queue_depth, self.changed
        )?;
        if let Some(processed) = self.processed {
            write!(f, " processed={}", processed)?;
        }
        if let Some(error) = &self.error {
            write!(f, " error=\"{}\"", error)?;
        }
        Ok(())
    }
}

//! Error taxonomy and the integer codes that cross the C boundary.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors produced by runtime operations.
///
/// A failed operation never leaves partial effects behind: state, queue and
/// dirty tracker look exactly as they did before the call.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Called before `init` or after `deinit`.
    #[error("Runtime not initialized")]
    NotInitialized,

    /// `init` called while a runtime is already live.
    #[error("Runtime already initialized")]
    AlreadyInitialized,

    /// Enqueue attempted on a queue at capacity.
    #[error("Event queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// Caller passed arguments the boundary cannot accept.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Reducer rejected malformed event data.
    #[error("Invalid payload for event 0x{event_type:04x}: {reason}")]
    InvalidPayload { event_type: u32, reason: String },

    /// Reducer failed for a reason not otherwise classified.
    #[error("Dispatch of event 0x{event_type:04x} failed: {reason}")]
    DispatchFailed { event_type: u32, reason: String },

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RuntimeError {
    /// Map the error to the code returned by the failing entry point.
    pub fn code(&self) -> ResultCode {
        match self {
            RuntimeError::NotInitialized => ResultCode::NotInitialized,
            RuntimeError::AlreadyInitialized => ResultCode::AlreadyInitialized,
            RuntimeError::QueueFull { .. } => ResultCode::QueueFull,
            RuntimeError::InvalidArgument(_) => ResultCode::InvalidArgument,
            RuntimeError::InvalidPayload { .. } => ResultCode::InvalidPayload,
            RuntimeError::DispatchFailed { .. } => ResultCode::DispatchFailed,
            RuntimeError::Config(_) => ResultCode::InvalidArgument,
        }
    }

    /// Attach the event type to a reducer failure.
    pub fn from_reduce(event_type: u32, err: ReduceError) -> Self {
        match err {
            ReduceError::InvalidPayload(reason) => RuntimeError::InvalidPayload { event_type, reason },
            ReduceError::Failed(reason) => RuntimeError::DispatchFailed { event_type, reason },
        }
    }
}

/// Failure reported by a reducer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReduceError {
    /// The event payload (or the current state payload) could not be decoded.
    #[error("{0}")]
    InvalidPayload(String),

    /// The transition could not complete.
    #[error("{0}")]
    Failed(String),
}

/// Integer status codes returned across the C boundary.
///
/// Code `2` is reserved (out-of-memory in earlier ABI revisions) and is
/// never returned.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Ok = 0,
    InvalidArgument = 1,
    AlreadyInitialized = 3,
    NotInitialized = 4,
    QueueFull = 5,
    InvalidPayload = 6,
    DispatchFailed = 7,
}

impl ResultCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<&RuntimeError> for ResultCode {
    fn from(err: &RuntimeError) -> Self {
        err.code()
    }
}

/// Caller-detected mismatch between a shell's compiled ABI version and the
/// library it loaded. The runtime itself never returns this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ABI version mismatch: shell expects {expected}, library provides {actual}")]
pub struct AbiMismatch {
    pub expected: u32,
    pub actual: u32,
}

//! Embeddable application runtime shared by every native UI shell.
//!
//! One authoritative, versioned state lives behind a stable C ABI. Shells
//! either dispatch events synchronously or queue them with a priority and
//! drain the queue later; reducers produce the next state and report which
//! fields they touched so each shell re-renders only what changed.
//!
//! # Architecture
//!
//! ```text
//! native shell ──→ abi (ember_*) ──→ host (global critical section)
//!                                         │
//!                       ┌─────────────────┴─────────────────┐
//!                       ▼                                   ▼
//!                 EventQueue ──pop──→ Dispatcher ──→ StateCell + DirtyTracker
//!                                         │
//!                                  ReducerRegistry
//! ```
//!
//! Rust embedders can skip the C layer entirely and own a [`Runtime`]
//! directly.

pub mod abi;
pub mod config;
pub mod demo;
pub mod error;
pub mod event;
pub mod logging;
pub mod reducer;
pub mod replay;
pub mod runtime;

pub use config::RuntimeConfig;
pub use error::{ReduceError, ResultCode, RuntimeError};
pub use event::{Event, EventType, Priority};
pub use reducer::{Reducer, ReducerRegistry, Reduction};
pub use runtime::{DiffSummary, FieldSet, ProcessReport, Runtime, StateDraft, StateView};

/// Version of the C ABI exported by this build.
///
/// Bumped whenever an `ember_*` signature or a `#[repr(C)]` layout changes.
pub const ABI_VERSION: u32 = 1;

/// Checks a shell's compiled ABI expectation against this build.
///
/// The runtime never fails on its own because of a mismatch; this is the
/// check embedders run before touching anything else.
pub fn check_abi_version(expected: u32) -> Result<(), error::AbiMismatch> {
    if expected == ABI_VERSION {
        Ok(())
    } else {
        Err(error::AbiMismatch {
            expected,
            actual: ABI_VERSION,
        })
    }
}

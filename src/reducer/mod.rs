//! Reducers: the only place state transitions happen.
//!
//! # Architecture
//!
//! ```text
//! Event ──→ ReducerRegistry ──→ Reducer ──→ (next StateDraft, touched FieldSet)
//!   ↑                                              │
//!   └──────────── shell reads state ◄──────────────┘
//! ```
//!
//! - **StateDraft**: the state a reducer reads and produces
//! - **Event**: user action or system notification
//! - **Reducer**: pure function that maps the two to the next state

mod registry;
mod traits;

pub use registry::ReducerRegistry;
pub use traits::{Reducer, Reduction};

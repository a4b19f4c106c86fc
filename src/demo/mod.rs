//! Sample application bundled with the runtime.
//!
//! The C boundary starts with these reducers registered so every shell can
//! exercise the same counter and todo list. Embedders that own a
//! [`crate::Runtime`] register their own reducers instead.

mod layout;
mod reducer;

pub use layout::{DemoState, Filter, TodoItem, HEADER_SIZE, MAX_TODOS, TEXT_CAPACITY, TODO_STRIDE};
pub use reducer::DemoReducer;

use std::sync::Arc;

use crate::event::EventType;
use crate::reducer::ReducerRegistry;
use crate::runtime::StateDraft;

/// Field ids reported to the dirty tracker.
pub mod fields {
    pub const COUNTER: u16 = 0;
    pub const INPUT_TEXT: u16 = 1;
    pub const TODOS: u16 = 2;
    pub const FILTER: u16 = 3;
    pub const SCREEN: u16 = 4;
}

/// Application-defined event codes (custom range).
pub mod events {
    pub const TODO_ADD: u32 = 0x2001;
    pub const TODO_TOGGLE: u32 = 0x2002;
    pub const TODO_REMOVE: u32 = 0x2003;
    pub const TODO_TOGGLE_ALL: u32 = 0x2004;
    pub const TODO_CLEAR_COMPLETED: u32 = 0x2005;
    pub const TODO_SET_FILTER: u32 = 0x2006;
}

/// Every event code the demo reducer handles.
pub fn handled_events() -> Vec<u32> {
    let mut codes: Vec<u32> = [
        EventType::CounterIncrement,
        EventType::CounterDecrement,
        EventType::CounterReset,
        EventType::TextInput,
        EventType::TextCommit,
        EventType::Navigate,
        EventType::NavigateBack,
    ]
    .into_iter()
    .map(EventType::raw)
    .collect();
    codes.extend([
        events::TODO_ADD,
        events::TODO_TOGGLE,
        events::TODO_REMOVE,
        events::TODO_TOGGLE_ALL,
        events::TODO_CLEAR_COMPLETED,
        events::TODO_SET_FILTER,
    ]);
    codes
}

/// Registry with the demo reducer bound to every code it handles.
pub fn registry() -> ReducerRegistry {
    let mut registry = ReducerRegistry::new();
    registry.register_all(handled_events(), Arc::new(DemoReducer));
    registry
}

/// Initial state with a fully encoded payload.
pub fn initial_state() -> StateDraft {
    StateDraft::with_payload(DemoState::default().encode())
}

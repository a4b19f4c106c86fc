use std::collections::HashMap;
use std::sync::Arc;

use crate::reducer::Reducer;

/// Maps raw event codes to the reducer that handles them.
///
/// Codes without an entry are inert when dispatched.
#[derive(Clone, Default)]
pub struct ReducerRegistry {
    reducers: HashMap<u32, Arc<dyn Reducer>>,
}

impl ReducerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `reducer` for one event code, replacing any previous entry.
    pub fn register(&mut self, event_type: u32, reducer: Arc<dyn Reducer>) -> &mut Self {
        if self.reducers.insert(event_type, reducer).is_some() {
            tracing::debug!(event_type = format_args!("0x{:04x}", event_type), "Reducer replaced");
        }
        self
    }

    /// Register one reducer for several event codes.
    pub fn register_all(
        &mut self,
        event_types: impl IntoIterator<Item = u32>,
        reducer: Arc<dyn Reducer>,
    ) -> &mut Self {
        for event_type in event_types {
            self.register(event_type, reducer.clone());
        }
        self
    }

    pub fn get(&self, event_type: u32) -> Option<&Arc<dyn Reducer>> {
        self.reducers.get(&event_type)
    }

    pub fn contains(&self, event_type: u32) -> bool {
        self.reducers.contains_key(&event_type)
    }

    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl std::fmt::Debug for ReducerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut codes: Vec<_> = self.reducers.keys().copied().collect();
        codes.sort_unstable();
        f.debug_struct("ReducerRegistry").field("event_types", &codes).finish()
    }
}

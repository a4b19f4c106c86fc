//! Applies one event to the State Cell through the registered reducer.

use std::panic::{self, AssertUnwindSafe};

use crate::error::{ReduceError, RuntimeError};
use crate::event::Event;
use crate::reducer::{ReducerRegistry, Reduction};
use crate::runtime::state::StateCell;
use crate::runtime::tracker::FieldSet;

/// Outcome of applying a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The transition committed; the cell now holds `version`.
    Committed { version: u64, touched: FieldSet },
    /// No reducer handled the event; nothing changed.
    Inert,
}

/// Single-writer transition engine.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: ReducerRegistry,
}

impl Dispatcher {
    pub fn new(registry: ReducerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ReducerRegistry {
        &self.registry
    }

    /// Run the reducer for `event` and commit its result.
    ///
    /// The reducer only ever sees a shared borrow of the current state, so a
    /// failing (or panicking) reducer leaves the cell and its version untouched.
    pub fn apply(&self, cell: &mut StateCell, event: &Event) -> Result<Applied, RuntimeError> {
        let event_type = event.raw_type();

        let Some(reducer) = self.registry.get(event_type) else {
            tracing::trace!(event = %event.event_type, "No reducer registered, event is inert");
            return Ok(Applied::Inert);
        };

        let mut touched = FieldSet::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            reducer.reduce(cell.current(), event, &mut touched)
        }))
        .unwrap_or_else(|payload| Err(ReduceError::Failed(panic_message(payload.as_ref()))));

        match result {
            Ok(Reduction::Next(next)) => {
                let version = cell.commit(next);
                tracing::debug!(
                    event = %event.event_type,
                    version,
                    changed = ?touched.iter().collect::<Vec<_>>(),
                    "Transition committed"
                );
                Ok(Applied::Committed { version, touched })
            }
            Ok(Reduction::Unhandled) => {
                tracing::trace!(event = %event.event_type, "Reducer left event unhandled");
                Ok(Applied::Inert)
            }
            Err(err) => {
                tracing::warn!(event = %event.event_type, error = %err, "Reducer failed");
                Err(RuntimeError::from_reduce(event_type, err))
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("reducer panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("reducer panicked: {}", s)
    } else {
        "reducer panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResultCode;
    use crate::runtime::state::StateDraft;
    use std::sync::Arc;

    fn bump(current: &StateDraft, _: &Event, touched: &mut FieldSet) -> Result<Reduction, ReduceError> {
        let mut next = current.clone();
        next.payload.push(1);
        touched.insert(0);
        Ok(Reduction::Next(next))
    }

    fn reject(_: &StateDraft, _: &Event, touched: &mut FieldSet) -> Result<Reduction, ReduceError> {
        touched.insert(0);
        Err(ReduceError::InvalidPayload("nope".into()))
    }

    fn explode(_: &StateDraft, _: &Event, _: &mut FieldSet) -> Result<Reduction, ReduceError> {
        panic!("kaboom")
    }

    fn dispatcher() -> Dispatcher {
        let mut registry = ReducerRegistry::new();
        registry.register(1, Arc::new(bump));
        registry.register(2, Arc::new(reject));
        registry.register(3, Arc::new(explode));
        Dispatcher::new(registry)
    }

    #[test]
    fn commit_reports_version_and_fields() {
        let mut cell = StateCell::new(StateDraft::default());
        let applied = dispatcher().apply(&mut cell, &Event::bare(1u32)).unwrap();
        assert_eq!(
            applied,
            Applied::Committed {
                version: 1,
                touched: [0u16].into_iter().collect()
            }
        );
        assert_eq!(cell.view().payload, &[1]);
    }

    #[test]
    fn unregistered_event_is_inert() {
        let mut cell = StateCell::new(StateDraft::default());
        assert_eq!(dispatcher().apply(&mut cell, &Event::bare(99u32)).unwrap(), Applied::Inert);
        assert_eq!(cell.version(), 0);
    }

    #[test]
    fn rejected_event_leaves_cell_untouched() {
        let mut cell = StateCell::new(StateDraft::with_payload(vec![7]));
        let err = dispatcher().apply(&mut cell, &Event::bare(2u32)).unwrap_err();
        assert_eq!(err.code(), ResultCode::InvalidPayload);
        assert_eq!(cell.version(), 0);
        assert_eq!(cell.view().payload, &[7]);
    }

    #[test]
    fn panicking_reducer_becomes_dispatch_failure() {
        let mut cell = StateCell::new(StateDraft::default());
        let err = dispatcher().apply(&mut cell, &Event::bare(3u32)).unwrap_err();
        assert_eq!(err.code(), ResultCode::DispatchFailed);
        assert!(err.to_string().contains("kaboom"));
        assert_eq!(cell.version(), 0);
    }
}

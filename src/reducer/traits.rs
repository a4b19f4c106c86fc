//! Reducer trait.

use crate::error::ReduceError;
use crate::event::Event;
use crate::runtime::{FieldSet, StateDraft};

/// Result of a reducer that completed.
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    /// Commit this state and bump the version.
    Next(StateDraft),
    /// The event does not apply; nothing changes.
    Unhandled,
}

/// Reducer transforms state based on events.
///
/// Must be a pure function: (current state, event) -> next state. Side
/// effects belong to the shell around the dispatch call. Fields the
/// transition altered are reported through `touched`; the dispatcher
/// discards them unless the reducer returns [`Reduction::Next`].
pub trait Reducer: Send + Sync {
    fn reduce(
        &self,
        current: &StateDraft,
        event: &Event,
        touched: &mut FieldSet,
    ) -> Result<Reduction, ReduceError>;
}

impl<F> Reducer for F
where
    F: Fn(&StateDraft, &Event, &mut FieldSet) -> Result<Reduction, ReduceError> + Send + Sync,
{
    fn reduce(
        &self,
        current: &StateDraft,
        event: &Event,
        touched: &mut FieldSet,
    ) -> Result<Reduction, ReduceError> {
        self(current, event, touched)
    }
}

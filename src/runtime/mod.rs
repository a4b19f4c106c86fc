//! The runtime instance: State Cell, Event Queue, Dirty Tracker and Dispatcher.
//!
//! A [`Runtime`] is an ordinary owned value: construct one, drive it, drop
//! it. The C boundary keeps exactly one of them behind a global lock (see
//! [`crate::abi`]), but nothing here depends on that.
//!
//! Dirty tracking is scoped to one call. `dispatch` overwrites the tracker
//! with the fields of its single transition; an inert or failed dispatch
//! leaves it alone. `process_events` clears the tracker when it starts and
//! accumulates every transition it commits, so a drain that applies nothing
//! reports nothing changed.

mod dispatch;
mod queue;
mod state;
mod tracker;

pub use dispatch::{Applied, Dispatcher};
pub use queue::{EventQueue, QueuedEvent};
pub use state::{StateCell, StateDraft, StateView};
pub use tracker::{DiffSummary, DirtyTracker, FieldSet};

use crate::config::RuntimeConfig;
use crate::demo;
use crate::error::RuntimeError;
use crate::event::{Event, EventType, Priority};
use crate::reducer::ReducerRegistry;

/// What a `process_events` call did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessReport {
    /// Events that completed with success, inert ones included.
    pub processed: u32,
    /// Events that committed a transition (each bumped the version by one).
    pub committed: u32,
    /// Events whose reducer failed; they were consumed and discarded.
    pub failed: u32,
    /// The most recent failure, if any.
    pub last_error: Option<String>,
}

pub struct Runtime {
    cell: StateCell,
    queue: EventQueue,
    tracker: DirtyTracker,
    dispatcher: Dispatcher,
    max_payload_len: usize,
}

impl Runtime {
    pub fn new(config: &RuntimeConfig, registry: ReducerRegistry) -> Self {
        Self::with_initial_state(config, registry, StateDraft::default())
    }

    pub fn with_initial_state(
        config: &RuntimeConfig,
        registry: ReducerRegistry,
        initial: StateDraft,
    ) -> Self {
        Self {
            cell: StateCell::new(initial),
            queue: EventQueue::new(config.queue.capacity),
            tracker: DirtyTracker::new(config.tracker.max_fields),
            dispatcher: Dispatcher::new(registry),
            max_payload_len: config.queue.max_payload_len,
        }
    }

    /// Runtime with default config, the demo reducers and the demo's
    /// initial state. This is what `ember_init` serves without a config file.
    pub fn with_defaults() -> Self {
        Self::with_initial_state(
            &RuntimeConfig::default(),
            demo::registry(),
            demo::initial_state(),
        )
    }

    /// Apply one event immediately, bypassing the queue.
    ///
    /// Unknown or unhandled event types succeed without changing anything,
    /// whatever their payload.
    pub fn dispatch(&mut self, event_type: u32, payload: &[u8]) -> Result<Applied, RuntimeError> {
        if self.dispatcher.registry().contains(event_type) {
            self.check_payload(payload)?;
        }
        let event = Event::new(event_type, payload);
        let applied = self.dispatcher.apply(&mut self.cell, &event)?;
        if let Applied::Committed { version, touched } = &applied {
            self.tracker.overwrite(touched, *version);
        }
        Ok(applied)
    }

    /// Copy an event into the queue for a later `process_events`.
    pub fn queue_event(
        &mut self,
        event_type: u32,
        payload: &[u8],
        priority: impl Into<Priority>,
    ) -> Result<(), RuntimeError> {
        self.check_payload(payload)?;
        let event = Event::new(event_type, payload).with_priority(priority);
        self.queue.push(event).inspect_err(|err| {
            tracing::warn!(event = %EventType::from_raw(event_type), error = %err, "Event rejected");
        })
    }

    /// Pop and apply up to `max_events` queued events in priority order.
    pub fn process_events(&mut self, max_events: u32) -> ProcessReport {
        let mut report = ProcessReport::default();
        let mut attempted = 0u32;
        self.tracker.reset(self.cell.version());

        while attempted < max_events {
            let Some(queued) = self.queue.pop() else {
                break;
            };
            attempted += 1;

            match self.dispatcher.apply(&mut self.cell, &queued.event) {
                Ok(Applied::Committed { version, touched }) => {
                    self.tracker.merge(&touched, version);
                    report.committed += 1;
                    report.processed += 1;
                }
                Ok(Applied::Inert) => report.processed += 1,
                Err(err) => {
                    report.failed += 1;
                    report.last_error = Some(err.to_string());
                }
            }
        }

        if attempted > 0 {
            tracing::debug!(
                processed = report.processed,
                committed = report.committed,
                failed = report.failed,
                remaining = self.queue.len(),
                "Processed queued events"
            );
        }
        report
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn queue_clear(&mut self) -> usize {
        let dropped = self.queue.clear();
        if dropped > 0 {
            tracing::debug!(dropped, "Event queue cleared");
        }
        dropped
    }

    pub fn state(&self) -> StateView<'_> {
        self.cell.view()
    }

    pub fn version(&self) -> u64 {
        self.cell.version()
    }

    pub fn counter(&self) -> i64 {
        self.cell.counter()
    }

    pub fn field_changed(&self, field_id: u16) -> bool {
        self.tracker.field_changed(field_id)
    }

    pub fn changed_fields(&self) -> &FieldSet {
        self.tracker.changed()
    }

    pub fn diff(&self) -> DiffSummary {
        self.tracker.diff()
    }

    pub fn registry(&self) -> &ReducerRegistry {
        self.dispatcher.registry()
    }

    fn check_payload(&self, payload: &[u8]) -> Result<(), RuntimeError> {
        if payload.len() > self.max_payload_len {
            return Err(RuntimeError::InvalidArgument(format!(
                "payload of {} bytes exceeds limit of {}",
                payload.len(),
                self.max_payload_len
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("version", &self.cell.version())
            .field("queue_depth", &self.queue.len())
            .field("changed", &self.tracker.changed())
            .finish()
    }
}

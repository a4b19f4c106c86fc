//! Bounded priority queue of pending events.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::RuntimeError;
use crate::event::Event;

/// An event plus its insertion sequence number.
#[derive(Debug, Clone)]
pub struct QueuedEvent {
    pub event: Event,
    pub seq: u64,
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedEvent {}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEvent {
    /// Max-heap order: higher priority first, then lower sequence (FIFO).
    fn cmp(&self, other: &Self) -> Ordering {
        self.event
            .priority
            .cmp(&other.event.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Fixed-capacity queue ordered by descending priority, FIFO within a priority.
///
/// A full queue rejects new events with [`RuntimeError::QueueFull`] instead of
/// dropping or blocking; the caller decides whether to retry or give up.
#[derive(Debug)]
pub struct EventQueue {
    heap: BinaryHeap<QueuedEvent>,
    capacity: usize,
    next_seq: u64,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity.min(1024)),
            capacity,
            next_seq: 0,
        }
    }

    pub fn push(&mut self, event: Event) -> Result<(), RuntimeError> {
        if self.heap.len() >= self.capacity {
            return Err(RuntimeError::QueueFull {
                capacity: self.capacity,
            });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedEvent { event, seq });
        Ok(())
    }

    pub fn pop(&mut self) -> Option<QueuedEvent> {
        self.heap.pop()
    }

    pub fn peek(&self) -> Option<&QueuedEvent> {
        self.heap.peek()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Discard every pending event without applying it. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.heap.len();
        self.heap.clear();
        dropped
    }
}

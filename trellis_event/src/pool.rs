// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event recycling.

use crate::event::{Event, EventFlags, EventKind, EventPayload, PropagationPhase};

/// Recycles [`Event`] records between dispatches.
///
/// Every acquisition is assigned a fresh event id, so a recycled record is never
/// observed with the id of a previous acquisition. The pool counts acquisitions
/// and releases; once all dispatch queues are drained the two are equal.
#[derive(Debug)]
pub struct EventPool {
    free: Vec<Event>,
    next_event_id: u64,
    acquired: u64,
    released: u64,
    capacity: usize,
}

impl Default for EventPool {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl EventPool {
    /// Create a pool keeping at most `capacity` free records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: Vec::new(),
            next_event_id: 1,
            acquired: 0,
            released: 0,
            capacity,
        }
    }

    /// Take a record from the pool, initialized for `kind`.
    pub fn acquire(&mut self, kind: EventKind, payload: EventPayload, timestamp_ms: u64) -> Event {
        let mut event = self.free.pop().unwrap_or_else(Event::blank);
        event.kind = kind;
        event.payload = payload;
        event.timestamp_ms = timestamp_ms;
        event.event_id = self.next_event_id;
        self.next_event_id += 1;
        self.acquired += 1;
        event
    }

    /// Return a record to the pool. The event must have come from [`EventPool::acquire`].
    pub fn release(&mut self, mut event: Event) {
        self.released += 1;
        debug_assert!(
            self.released <= self.acquired,
            "released more events than were acquired"
        );
        if self.free.len() >= self.capacity {
            return;
        }
        event.target = None;
        event.current_target = None;
        event.path.clear();
        event.phase = PropagationPhase::None;
        event.flags = EventFlags::empty();
        event.payload = EventPayload::None;
        event.synthesized_from = None;
        event.event_id = 0;
        self.free.push(event);
    }

    /// Number of acquisitions so far.
    pub fn acquired(&self) -> u64 {
        self.acquired
    }

    /// Number of releases so far.
    pub fn released(&self) -> u64 {
        self.released
    }

    /// Events acquired but not yet released.
    pub fn outstanding(&self) -> u64 {
        self.acquired - self.released
    }

    /// Number of free records ready for reuse.
    pub fn free_len(&self) -> usize {
        self.free.len()
    }
}

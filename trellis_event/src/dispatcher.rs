// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event queueing, re-entrancy gates, and dispatcher contexts.
//!
//! The [`EventDispatcher`] owns the *when* of event processing; the *how* is left
//! to a [`DispatchHost`], usually the surface that owns the element tree.
//!
//! - Processing an event closes a gate for its duration. Events dispatched with
//!   [`DispatchMode::Queued`] while any gate is closed are queued instead of being
//!   processed re-entrantly.
//! - Opening the last gate drains the queue in FIFO order. Events queued while
//!   the drain runs join the back of the same queue, behind everything already
//!   waiting.
//! - A context push flushes the current queue and starts a fresh, isolated one
//!   (used by modal scopes). A pop restores the outer context and requires the
//!   inner one to be fully drained.
//!
//! Every event handed to the dispatcher is returned to the host through
//! [`DispatchHost::release_event`] exactly once.

use std::collections::VecDeque;

use crate::error::FrameAbort;
use crate::event::Event;

/// How to dispatch an event.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DispatchMode {
    /// Queue the event if another event is being processed.
    #[default]
    Queued,
    /// Process the event right away, even re-entrantly.
    Immediate,
}

/// The environment events are processed in.
pub trait DispatchHost {
    /// The dispatcher owned by this host.
    fn dispatcher(&mut self) -> &mut EventDispatcher;

    /// Run the propagation of one event.
    fn process_event(&mut self, event: &mut Event) -> Result<(), FrameAbort>;

    /// Take back an event the dispatcher is done with.
    fn release_event(&mut self, event: Event);
}

#[derive(Debug, Default)]
struct DispatchContext {
    queue: VecDeque<Event>,
    gate_count: u32,
    draining: bool,
}

/// Queue, gate counter, and context stack of an event pipeline.
#[derive(Debug, Default)]
pub struct EventDispatcher {
    current: DispatchContext,
    saved: Vec<DispatchContext>,
    processing_depth: u32,
}

impl EventDispatcher {
    /// Create an idle dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of closed gates in the current context.
    pub fn gate_count(&self) -> u32 {
        self.current.gate_count
    }

    /// Number of events waiting in the current context.
    pub fn queued_len(&self) -> usize {
        self.current.queue.len()
    }

    /// Number of pushed contexts.
    pub fn context_depth(&self) -> usize {
        self.saved.len()
    }

    /// Whether a queue drain is in progress.
    pub fn is_processing_queue(&self) -> bool {
        self.processing_depth > 0
    }

    /// Whether a queued dispatch would be processed right away.
    pub fn dispatches_immediately(&self) -> bool {
        self.current.gate_count == 0
    }

    /// Close a gate: until it is opened, queued dispatches are deferred.
    pub fn close_gate(&mut self) {
        self.current.gate_count += 1;
    }

    /// Dispatch `event` on `host`.
    ///
    /// Returns the frame abort raised while processing it (or while draining
    /// events it caused), if any.
    pub fn dispatch<H: DispatchHost + ?Sized>(
        host: &mut H,
        mut event: Event,
        mode: DispatchMode,
    ) -> Result<(), FrameAbort> {
        event.mark_dispatched();
        let dispatcher = host.dispatcher();
        if mode == DispatchMode::Immediate || dispatcher.dispatches_immediately() {
            Self::process_event(host, event)
        } else {
            tracing::trace!(
                kind = ?event.kind(),
                event_id = event.event_id(),
                gates = dispatcher.current.gate_count,
                "event queued"
            );
            dispatcher.current.queue.push_back(event);
            Ok(())
        }
    }

    /// Open a gate. Opening the last one drains the queue.
    ///
    /// # Panics
    ///
    /// Panics if no gate is closed.
    pub fn open_gate<H: DispatchHost + ?Sized>(host: &mut H) -> Result<(), FrameAbort> {
        let dispatcher = host.dispatcher();
        assert!(
            dispatcher.current.gate_count > 0,
            "open_gate called without a matching close_gate"
        );
        dispatcher.current.gate_count -= 1;
        let current = &dispatcher.current;
        if current.gate_count == 0 && !current.draining && !current.queue.is_empty() {
            Self::process_event_queue(host)
        } else {
            Ok(())
        }
    }

    /// Process one event under a gate, then release it.
    fn process_event<H: DispatchHost + ?Sized>(host: &mut H, mut event: Event) -> Result<(), FrameAbort> {
        host.dispatcher().close_gate();
        tracing::trace!(kind = ?event.kind(), event_id = event.event_id(), "process event");
        let result = host.process_event(&mut event);
        host.release_event(event);
        let drained = Self::open_gate(host);
        match (result, drained) {
            (Err(_), Err(_)) => {
                panic!("a second frame abort surfaced while the first one was unwinding")
            }
            (result, drained) => result.and(drained),
        }
    }

    /// Drain the current queue.
    ///
    /// Each event is released even if its processing aborts, and the remaining
    /// events are still processed. The first abort is returned once the queue is
    /// empty. Calling this while the current queue is already being drained
    /// further up the stack does nothing; that drain picks the events up.
    ///
    /// # Panics
    ///
    /// Panics if a second abort surfaces during the same drain.
    pub fn process_event_queue<H: DispatchHost + ?Sized>(host: &mut H) -> Result<(), FrameAbort> {
        if host.dispatcher().current.draining {
            return Ok(());
        }
        host.dispatcher().current.draining = true;
        let result = Self::drain(host);
        host.dispatcher().current.draining = false;
        result
    }

    /// Pop and process events until the current queue is empty.
    fn drain<H: DispatchHost + ?Sized>(host: &mut H) -> Result<(), FrameAbort> {
        host.dispatcher().processing_depth += 1;
        let mut abort = None;
        while let Some(event) = host.dispatcher().current.queue.pop_front() {
            if let Err(e) = Self::process_event(host, event) {
                assert!(
                    abort.is_none(),
                    "a second frame abort surfaced in the same drain"
                );
                tracing::debug!("frame abort while draining the event queue");
                abort = Some(e);
            }
        }
        host.dispatcher().processing_depth -= 1;
        abort.map_or(Ok(()), Err)
    }

    /// Flush the current queue, then start an isolated context with an empty queue
    /// and no closed gates.
    pub fn push_dispatcher_context<H: DispatchHost + ?Sized>(host: &mut H) -> Result<(), FrameAbort> {
        let was_draining = std::mem::replace(&mut host.dispatcher().current.draining, true);
        let flushed = Self::drain(host);
        host.dispatcher().current.draining = was_draining;
        let dispatcher = host.dispatcher();
        let outer = std::mem::take(&mut dispatcher.current);
        dispatcher.saved.push(outer);
        tracing::trace!(depth = dispatcher.saved.len(), "dispatcher context pushed");
        flushed
    }

    /// Restore the context saved by the matching push.
    ///
    /// # Panics
    ///
    /// Panics if there is no pushed context, or if the current one still has
    /// queued events or closed gates.
    pub fn pop_dispatcher_context(&mut self) {
        assert!(
            !self.saved.is_empty(),
            "pop_dispatcher_context called without a matching push"
        );
        assert!(
            self.current.gate_count == 0,
            "pop_dispatcher_context called with {} closed gate(s)",
            self.current.gate_count
        );
        assert!(
            self.current.queue.is_empty(),
            "pop_dispatcher_context called with {} queued event(s)",
            self.current.queue.len()
        );
        if let Some(outer) = self.saved.pop() {
            self.current = outer;
        }
        tracing::trace!(depth = self.saved.len(), "dispatcher context popped");
    }
}

// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Event: the event record and the state machines around it.
//!
//! This crate provides the building blocks of a retained-mode event pipeline.
//! It knows about elements only through [`trellis_tree::ElementTree`] queries and
//! leaves propagation itself to the host (see `trellis_panel`).
//!
//! - [`Event`], [`EventKind`] and the typed payloads, pooled by [`EventPool`].
//! - [`EventCallbackRegistry`]: per-element, phase-tagged callbacks that stay
//!   consistent while callbacks register or unregister other callbacks.
//! - [`EventDispatcher`]: the queue, re-entrancy gates, and context stack. A
//!   [`DispatchHost`] supplies the actual processing.
//! - [`pointer::PointerDeviceState`]: process-wide pointer positions and buttons.
//! - [`under_pointer::ElementUnderPointer`]: pending and committed hover targets,
//!   turned into enter/leave/over/out transitions.
//! - [`click::ClickDetector`]: click and multi-click recognition.
//! - [`drag::DragState`]: the drag threshold protocol.
//!
//! ## Dispatch example
//!
//! ```
//! use trellis_event::{
//!     DispatchHost, DispatchMode, Event, EventDispatcher, EventKind, EventPayload, EventPool,
//!     FrameAbort,
//! };
//!
//! #[derive(Default)]
//! struct Host {
//!     dispatcher: EventDispatcher,
//!     pool: EventPool,
//!     seen: Vec<EventKind>,
//! }
//!
//! impl DispatchHost for Host {
//!     fn dispatcher(&mut self) -> &mut EventDispatcher {
//!         &mut self.dispatcher
//!     }
//!
//!     fn process_event(&mut self, event: &mut Event) -> Result<(), FrameAbort> {
//!         self.seen.push(event.kind());
//!         if event.kind() == EventKind::KeyDown {
//!             // Dispatched while KeyDown is processed: runs after it, not inside it.
//!             let follow_up = self.pool.acquire(EventKind::KeyUp, EventPayload::None, 0);
//!             EventDispatcher::dispatch(self, follow_up, DispatchMode::Queued)?;
//!             self.seen.push(EventKind::Custom(0));
//!         }
//!         Ok(())
//!     }
//!
//!     fn release_event(&mut self, event: Event) {
//!         self.pool.release(event);
//!     }
//! }
//!
//! let mut host = Host::default();
//! let key = host.pool.acquire(EventKind::KeyDown, EventPayload::None, 0);
//! EventDispatcher::dispatch(&mut host, key, DispatchMode::Queued).unwrap();
//!
//! assert_eq!(host.seen, [EventKind::KeyDown, EventKind::Custom(0), EventKind::KeyUp]);
//! assert_eq!(host.pool.acquired(), host.pool.released());
//! ```

pub mod click;
pub mod drag;
pub mod pointer;
pub mod under_pointer;

mod dispatcher;
mod error;
mod event;
mod pool;
mod registry;

pub use dispatcher::{DispatchHost, DispatchMode, EventDispatcher};
pub use error::FrameAbort;
pub use event::{
    CaptureData, CommandData, Event, EventFlags, EventKind, EventPayload, EventTypeId,
    FocusChangeDirection, FocusData, GeometryData, Key, KeyData, Modifiers, NavigationData,
    NavigationDirection, PointerButtons, PointerData, PointerType, PropagationPath,
    PropagationPhase,
};
pub use pool::EventPool;
pub use registry::{CallbackEntry, CallbackList, CallbackPhase, EventCallbackRegistry, InvokePolicy};

// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer and mouse capture.
//!
//! Pointer capture requests are pending until the next pointer event of that
//! pointer is processed (before and after its propagation); the change is then
//! announced with `PointerCaptureOut` on the old capturer and `PointerCapture`
//! on the new one. Mouse capture takes effect immediately and also captures the
//! mouse pointer.

use trellis_event::pointer::{MAX_POINTERS, MOUSE_POINTER_ID};
use trellis_event::{CaptureData, EventKind, EventPayload, FrameAbort};
use trellis_tree::ElementId;

use crate::Panel;

#[derive(Copy, Clone, Debug, Default)]
struct PointerCapture {
    current: Option<ElementId>,
    pending: Option<ElementId>,
    dirty: bool,
}

impl PointerCapture {
    /// The capturer once the pending request is applied.
    fn effective(&self) -> Option<ElementId> {
        if self.dirty { self.pending } else { self.current }
    }
}

/// Capture state of one panel.
#[derive(Clone, Debug)]
pub(crate) struct CaptureState {
    pointers: [PointerCapture; MAX_POINTERS as usize],
    mouse: Option<ElementId>,
}

impl Default for CaptureState {
    fn default() -> Self {
        Self {
            pointers: [PointerCapture::default(); MAX_POINTERS as usize],
            mouse: None,
        }
    }
}

impl CaptureState {
    fn request(&mut self, pointer_id: u32, element: Option<ElementId>) -> bool {
        let Some(slot) = self.pointers.get_mut(pointer_id as usize) else {
            tracing::warn!(pointer_id, "pointer id out of range");
            return false;
        };
        slot.pending = element;
        slot.dirty = slot.pending != slot.current;
        true
    }

    /// Drop captures held by removed elements, without notifications.
    pub(crate) fn forget(&mut self, removed: &[ElementId]) {
        for slot in &mut self.pointers {
            if slot.current.is_some_and(|e| removed.contains(&e)) {
                slot.current = None;
            }
            if slot.pending.is_some_and(|e| removed.contains(&e)) {
                slot.pending = None;
            }
            slot.dirty = slot.pending != slot.current;
        }
        if self.mouse.is_some_and(|e| removed.contains(&e)) {
            self.mouse = None;
        }
    }
}

impl<S> Panel<S> {
    /// Route the events of `pointer_id` to `element` from the next pointer event on.
    ///
    /// Returns `false` for stale elements and out-of-range pointer ids.
    pub fn capture_pointer(&mut self, element: ElementId, pointer_id: u32) -> bool {
        if !self.tree.is_alive(element) {
            tracing::warn!(?element, pointer_id, "capture by a stale element");
            return false;
        }
        self.capture.request(pointer_id, Some(element))
    }

    /// Release the capture `element` holds (or requested) on `pointer_id`.
    ///
    /// Returns `false` if `element` is not the capturer.
    pub fn release_pointer(&mut self, element: ElementId, pointer_id: u32) -> bool {
        if !self.has_pointer_capture(element, pointer_id) {
            return false;
        }
        self.capture.request(pointer_id, None)
    }

    /// Whether `element` captures `pointer_id`, counting a pending request.
    pub fn has_pointer_capture(&self, element: ElementId, pointer_id: u32) -> bool {
        self.capture
            .pointers
            .get(pointer_id as usize)
            .is_some_and(|slot| slot.effective() == Some(element))
    }

    /// The element events of `pointer_id` are currently routed to.
    pub fn pointer_capturing_element(&self, pointer_id: u32) -> Option<ElementId> {
        self.capture
            .pointers
            .get(pointer_id as usize)
            .and_then(|slot| slot.current)
            .filter(|&e| self.tree.is_alive(e))
    }

    /// Route mouse events to `element` right away; the mouse pointer follows.
    pub fn capture_mouse(&mut self, element: ElementId) -> Result<(), FrameAbort> {
        if !self.tree.is_alive(element) {
            tracing::warn!(?element, "mouse capture by a stale element");
            return Ok(());
        }
        let old = self.capture.mouse.replace(element);
        self.capture.request(MOUSE_POINTER_ID, Some(element));
        self.announce_mouse_capture(old, Some(element))
    }

    /// Release the mouse capture, if any.
    pub fn release_mouse(&mut self) -> Result<(), FrameAbort> {
        let Some(old) = self.capture.mouse.take() else {
            return Ok(());
        };
        if self.has_pointer_capture(old, MOUSE_POINTER_ID) {
            self.capture.request(MOUSE_POINTER_ID, None);
        }
        self.announce_mouse_capture(Some(old), None)
    }

    /// The element mouse events are routed to.
    pub fn mouse_capturing_element(&self) -> Option<ElementId> {
        self.capture.mouse.filter(|&e| self.tree.is_alive(e))
    }

    fn announce_mouse_capture(
        &mut self,
        old: Option<ElementId>,
        new: Option<ElementId>,
    ) -> Result<(), FrameAbort> {
        if old == new {
            return Ok(());
        }
        tracing::debug!(?old, ?new, "mouse capture changed");
        self.announce_capture(
            (EventKind::MouseCaptureOut, EventKind::MouseCapture),
            MOUSE_POINTER_ID,
            old,
            new,
        )
    }

    /// Release every capture of `pointer_id`, e.g. once all its buttons are up.
    pub(crate) fn release_all_captures(&mut self, pointer_id: u32) {
        if self
            .capture
            .pointers
            .get(pointer_id as usize)
            .is_some_and(|slot| slot.effective().is_some())
        {
            self.capture.request(pointer_id, None);
        }
        if pointer_id == MOUSE_POINTER_ID {
            self.capture.mouse = None;
        }
    }

    /// Apply a pending capture request of `pointer_id`.
    pub(crate) fn process_pending_pointer_capture(&mut self, pointer_id: u32) -> Result<(), FrameAbort> {
        let Some(slot) = self.capture.pointers.get_mut(pointer_id as usize) else {
            return Ok(());
        };
        if !slot.dirty {
            return Ok(());
        }
        slot.dirty = false;
        let old = slot.current;
        slot.current = slot.pending;
        let new = slot.current;
        if old == new {
            return Ok(());
        }
        tracing::debug!(pointer_id, ?old, ?new, "pointer capture changed");
        self.announce_capture(
            (EventKind::PointerCaptureOut, EventKind::PointerCapture),
            pointer_id,
            old,
            new,
        )
    }

    fn announce_capture(
        &mut self,
        (out_kind, in_kind): (EventKind, EventKind),
        pointer_id: u32,
        old: Option<ElementId>,
        new: Option<ElementId>,
    ) -> Result<(), FrameAbort> {
        let mut result = Ok(());
        if let Some(old) = old.filter(|&e| self.tree.is_alive(e)) {
            let payload = EventPayload::Capture(CaptureData {
                pointer_id,
                related_target: new,
            });
            result = self.send_event(out_kind, payload, Some(old));
        }
        if let Some(new) = new {
            let payload = EventPayload::Capture(CaptureData {
                pointer_id,
                related_target: old,
            });
            let sent = self.send_event(in_kind, payload, Some(new));
            result = result.and(sent);
        }
        result
    }
}

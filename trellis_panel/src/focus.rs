// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The focus controller.
//!
//! Moving focus from `A` to `B` sends `FocusOut(A)`, `Blur(A)`, `FocusIn(B)`,
//! `Focus(B)`, skipping the half whose element is missing. The change is
//! announced right away, so nested changes start from `B`, but committed only
//! when `Blur` and `Focus` are processed.

use trellis_event::{Event, EventKind, EventPayload, FocusChangeDirection, FocusData, FrameAbort};
use trellis_focus::{focus_delegate, focusable_parent_for_pointer};
use trellis_tree::{ElementId, PseudoStates};

use crate::Panel;

impl<S> Panel<S> {
    /// The committed focused element as seen from the top of the tree; inside a
    /// composite this is the composite root.
    pub fn focused_element(&self) -> Option<ElementId> {
        self.focus.focused_element().filter(|&e| self.tree.is_alive(e))
    }

    /// The element that really has focus, counting changes not committed yet.
    pub fn leaf_focused_element(&self) -> Option<ElementId> {
        self.focus.leaf_focused_element().filter(|&e| self.tree.is_alive(e))
    }

    /// The committed focused element as seen by `relative_to`.
    pub fn retargeted_focused_element(&self, relative_to: Option<ElementId>) -> Option<ElementId> {
        self.focus.retargeted_focused_element(&self.tree, relative_to)
    }

    /// Whether `element` holds the committed focus.
    pub fn is_focused(&self, element: ElementId) -> bool {
        self.focus.is_focused(element)
    }

    /// Focus `element`, or the descendant it delegates focus to.
    ///
    /// An element that cannot take focus clears focus instead.
    pub fn focus(&mut self, element: ElementId) -> Result<(), FrameAbort> {
        let target = focus_delegate(&self.tree, element);
        self.switch_focus(target, FocusChangeDirection::Unspecified)
    }

    /// Clear focus.
    pub fn blur(&mut self) -> Result<(), FrameAbort> {
        self.switch_focus(None, FocusChangeDirection::Unspecified)
    }

    /// Move focus with the focus ring, as a key or navigation event would.
    pub fn move_focus(&mut self, direction: FocusChangeDirection) -> Result<(), FrameAbort> {
        let current = self.leaf_focused_element();
        match self.focus_ring.next_focusable(&self.tree, current, direction) {
            Some(next) if Some(next) != current => self.switch_focus(Some(next), direction),
            _ => Ok(()),
        }
    }

    /// Move focus to `new` and send the focus events.
    ///
    /// The sequence is queued as a unit, so a change started by one of its
    /// handlers runs after it and wins. Every event of the sequence is sent
    /// even if one aborts; the first abort is returned.
    pub fn switch_focus(
        &mut self,
        new: Option<ElementId>,
        direction: FocusChangeDirection,
    ) -> Result<(), FrameAbort> {
        let new = new.filter(|&n| self.tree.can_grab_focus(n));
        let old = self.leaf_focused_element();
        if new == old {
            return Ok(());
        }
        tracing::debug!(?old, ?new, ?direction, "focus change");
        if old.is_some() {
            self.focus.begin_pending(None);
        }
        if new.is_some() {
            self.focus.begin_pending(new);
        }

        let mut sequence = Vec::with_capacity(4);
        if let Some(old) = old {
            sequence.push((EventKind::FocusOut, old, new));
            sequence.push((EventKind::Blur, old, new));
        }
        if let Some(new) = new {
            sequence.push((EventKind::FocusIn, new, old));
            sequence.push((EventKind::Focus, new, old));
        }
        let mut abort = None;
        self.close_gate();
        for (kind, target, related_target) in sequence {
            let payload = EventPayload::Focus(FocusData {
                related_target,
                direction,
            });
            if let Err(e) = self.send_event(kind, payload, Some(target)) {
                abort.get_or_insert(e);
            }
        }
        if let Err(e) = self.open_gate() {
            abort.get_or_insert(e);
        }
        abort.map_or(Ok(()), Err)
    }

    /// Commit the pending change a `Blur` or `Focus` event stands for.
    pub(crate) fn commit_focus_change(&mut self, event: &Event) {
        let committed = match event.kind() {
            EventKind::Blur => None,
            EventKind::Focus => event.target(),
            _ => return,
        };
        let before = self.focus.links().first().map(|l| l.focused);
        self.focus.process_pending_focus_change(&self.tree, committed);
        let after = self.focus.links().first().map(|l| l.focused);
        if before != after {
            if let Some(before) = before {
                self.set_pseudo_state(before, PseudoStates::FOCUS, false);
            }
            if let Some(after) = after {
                self.set_pseudo_state(after, PseudoStates::FOCUS, true);
            }
        }
    }

    /// React to input that moves focus: `Tab`, navigation moves, pointer downs.
    pub(crate) fn apply_focus_navigation(&mut self, event: &mut Event) -> Result<(), FrameAbort> {
        if event.is_default_prevented() || event.processed_by_focus_controller() {
            return Ok(());
        }
        match event.kind() {
            EventKind::KeyDown | EventKind::NavigationMove => {
                let current = self.leaf_focused_element();
                let direction = self
                    .focus_ring
                    .focus_change_direction(&self.tree, current, event);
                if matches!(
                    direction,
                    FocusChangeDirection::None | FocusChangeDirection::Unspecified
                ) {
                    return Ok(());
                }
                event.mark_processed_by_focus_controller();
                self.move_focus(direction)
            }
            EventKind::PointerDown => {
                event.mark_processed_by_focus_controller();
                let new = event
                    .target()
                    .and_then(|t| focusable_parent_for_pointer(&self.tree, t))
                    .and_then(|f| focus_delegate(&self.tree, f));
                self.switch_focus(new, FocusChangeDirection::Unspecified)
            }
            _ => Ok(()),
        }
    }
}

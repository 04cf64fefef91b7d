// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch strategies: who an event is aimed at.
//!
//! Strategies are tried in a fixed order; the first one that claims the event
//! decides its target.

use trellis_event::pointer::MOUSE_POINTER_ID;
use trellis_event::{Event, EventKind};
use trellis_tree::ElementId;

use crate::Panel;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DispatchStrategy {
    PointerCapture,
    MouseCapture,
    Keyboard,
    Pointer,
    Mouse,
    Command,
    Default,
}

const STRATEGIES: [DispatchStrategy; 7] = [
    DispatchStrategy::PointerCapture,
    DispatchStrategy::MouseCapture,
    DispatchStrategy::Keyboard,
    DispatchStrategy::Pointer,
    DispatchStrategy::Mouse,
    DispatchStrategy::Command,
    DispatchStrategy::Default,
];

/// Pointer input events, as opposed to hover and capture notifications.
pub(crate) fn is_pointer_input(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::PointerDown | EventKind::PointerMove | EventKind::PointerUp | EventKind::PointerCancel
    )
}

fn is_mouse_input(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::MouseDown | EventKind::MouseMove | EventKind::MouseUp
    )
}

impl DispatchStrategy {
    fn claim<S>(self, panel: &Panel<S>, event: &Event) -> Option<ElementId> {
        let kind = event.kind();
        let untargeted = event.target().is_none();
        match self {
            Self::PointerCapture => {
                if !is_pointer_input(kind) {
                    return None;
                }
                let pointer_id = event.pointer()?.pointer_id;
                panel.pointer_capturing_element(pointer_id)
            }
            Self::MouseCapture => {
                if !is_mouse_input(kind) {
                    return None;
                }
                panel.mouse_capturing_element()
            }
            Self::Keyboard => (untargeted && (kind.is_keyboard() || kind.is_navigation()))
                .then(|| panel.focused_target())
                .flatten(),
            Self::Pointer => {
                if !untargeted || !is_pointer_input(kind) {
                    return None;
                }
                let pointer_id = event.pointer()?.pointer_id;
                panel
                    .under_pointer
                    .top_element_under_pointer(pointer_id)
                    .filter(|&e| panel.tree.is_alive(e))
                    .or_else(|| panel.tree.root())
            }
            Self::Mouse => {
                if !untargeted || !is_mouse_input(kind) {
                    return None;
                }
                let position = event.pointer()?.position;
                panel
                    .under_pointer
                    .top_element_under_pointer(MOUSE_POINTER_ID)
                    .filter(|&e| panel.tree.is_alive(e))
                    .or_else(|| panel.tree.pick(position))
                    .or_else(|| panel.tree.root())
            }
            Self::Command => (untargeted && kind.is_command())
                .then(|| panel.focused_target())
                .flatten(),
            Self::Default => {
                let target = event.target()?;
                if panel.tree.is_alive(target) {
                    Some(target)
                } else {
                    tracing::warn!(?target, ?kind, "event aimed at a stale element dropped");
                    None
                }
            }
        }
    }
}

impl<S> Panel<S> {
    /// Leaf focused element, or the root when nothing has focus.
    fn focused_target(&self) -> Option<ElementId> {
        self.focus
            .leaf_focused_element()
            .filter(|&e| self.tree.is_alive(e))
            .or_else(|| self.tree.root())
    }

    /// Run the strategies in order and return the target of the first claim.
    pub(crate) fn resolve_target(&self, event: &Event) -> Option<ElementId> {
        STRATEGIES.iter().find_map(|s| {
            let target = s.claim(self, event);
            if let Some(target) = target {
                tracing::trace!(strategy = ?s, ?target, kind = ?event.kind(), "event claimed");
            }
            target
        })
    }
}

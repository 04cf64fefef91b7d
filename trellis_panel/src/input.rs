// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input entry points and the pointer bookkeeping around each event.

use kurbo::Point;
use trellis_event::pointer::{MOUSE_POINTER_ID, pointer_type_of};
use trellis_event::{
    CommandData, DispatchMode, Event, EventKind, EventPayload, FrameAbort, Key, KeyData, Modifiers,
    NavigationData, NavigationDirection, PointerData, PointerType,
};
use trellis_tree::{ElementId, PseudoStates};

use crate::Panel;
use crate::strategy::is_pointer_input;

impl<S> Panel<S> {
    /// Feed a pointer press.
    pub fn pointer_down(&mut self, data: PointerData) -> Result<(), FrameAbort> {
        self.send_event(EventKind::PointerDown, EventPayload::Pointer(data), None)
    }

    /// Feed a pointer move.
    pub fn pointer_move(&mut self, data: PointerData) -> Result<(), FrameAbort> {
        self.send_event(EventKind::PointerMove, EventPayload::Pointer(data), None)
    }

    /// Feed a pointer release.
    pub fn pointer_up(&mut self, data: PointerData) -> Result<(), FrameAbort> {
        self.send_event(EventKind::PointerUp, EventPayload::Pointer(data), None)
    }

    /// Feed a pointer cancellation (e.g. a touch taken over by the system).
    pub fn pointer_cancel(&mut self, data: PointerData) -> Result<(), FrameAbort> {
        self.send_event(EventKind::PointerCancel, EventPayload::Pointer(data), None)
    }

    /// The pointer left the surface: hover ends on the next commit.
    pub fn pointer_exit_surface(&mut self, pointer_id: u32) -> Result<(), FrameAbort> {
        self.pointer_state
            .borrow_mut()
            .set_outside_surface(pointer_id, true);
        self.under_pointer.clear_pointer(pointer_id);
        self.commit_element_under_pointer(pointer_id)
    }

    /// Feed a key press, aimed at the focused element.
    pub fn key_down(&mut self, key: Key, modifiers: Modifiers) -> Result<(), FrameAbort> {
        let payload = EventPayload::Key(KeyData { key, modifiers });
        self.send_event(EventKind::KeyDown, payload, None)
    }

    /// Feed a key release, aimed at the focused element.
    pub fn key_up(&mut self, key: Key, modifiers: Modifiers) -> Result<(), FrameAbort> {
        let payload = EventPayload::Key(KeyData { key, modifiers });
        self.send_event(EventKind::KeyUp, payload, None)
    }

    /// Feed a navigation move (arrow keys, gamepad), aimed at the focused element.
    pub fn navigation_move(
        &mut self,
        direction: NavigationDirection,
        modifiers: Modifiers,
    ) -> Result<(), FrameAbort> {
        let payload = EventPayload::Navigation(NavigationData {
            direction,
            modifiers,
        });
        self.send_event(EventKind::NavigationMove, payload, None)
    }

    /// Feed a command, aimed at the focused element. With `validate` set, a
    /// `ValidateCommand` is sent instead of an `ExecuteCommand`.
    pub fn command(&mut self, name: &'static str, validate: bool) -> Result<(), FrameAbort> {
        let kind = if validate {
            EventKind::ValidateCommand
        } else {
            EventKind::ExecuteCommand
        };
        self.send_event(kind, EventPayload::Command(CommandData { name }), None)
    }

    /// Bookkeeping before an event is aimed: pointer state, pending captures,
    /// hover picks, focus commits.
    pub(crate) fn pre_dispatch(&mut self, event: &mut Event) -> Result<(), FrameAbort> {
        let kind = event.kind();
        if kind == EventKind::Blur || kind == EventKind::Focus {
            self.commit_focus_change(event);
            return Ok(());
        }
        if !is_pointer_input(kind) {
            return Ok(());
        }
        let Some(data) = event.pointer_mut() else {
            return Ok(());
        };
        let pointer_id = data.pointer_id;
        {
            let mut state = self.pointer_state.borrow_mut();
            let previous = state.position(pointer_id);
            state.save_pointer_position(pointer_id, data.position, Some(self.surface));
            state.set_outside_surface(pointer_id, false);
            match (kind, data.button) {
                (EventKind::PointerDown, Some(button)) => state.press_button(pointer_id, button),
                (EventKind::PointerUp, Some(button)) => state.release_button(pointer_id, button),
                (EventKind::PointerCancel, _) => state.release_all_buttons(pointer_id),
                _ => {}
            }
            data.pressed_buttons = state.pressed_buttons(pointer_id);
            if kind == EventKind::PointerMove {
                data.delta = data.position - previous;
            }
        }
        let position = data.position;
        if kind != EventKind::PointerCancel {
            let lifted = kind == EventKind::PointerUp && pointer_type_of(pointer_id) != PointerType::Mouse;
            let picked = if lifted { None } else { self.tree.pick(position) };
            self.under_pointer
                .set_element_under_pointer(pointer_id, picked, position);
        }
        self.process_pending_pointer_capture(pointer_id)
    }

    /// Stamp the multi-click count on a pointer down aimed at `target`.
    pub(crate) fn stamp_click_count(&mut self, event: &mut Event, target: ElementId) {
        let timestamp_ms = event.timestamp_ms();
        let Some(data) = event.pointer_mut() else {
            return;
        };
        data.click_count = self.clicks.on_pointer_down(
            data.pointer_id,
            target,
            data.position,
            timestamp_ms,
            &self.tree,
        );
        if let Some(layout) = self.tree.layout(target) {
            data.local_position = data.position - layout.origin().to_vec2();
        }
    }

    /// Derived events after a pointer event: hover transitions, compatibility
    /// mouse events, clicks, and the end of a capture.
    pub(crate) fn post_dispatch(&mut self, event: &Event) -> Result<(), FrameAbort> {
        let kind = event.kind();
        if !is_pointer_input(kind) {
            return Ok(());
        }
        let Some(&data) = event.pointer() else {
            return Ok(());
        };
        let pointer_id = data.pointer_id;
        let mut abort = None;
        let mut note = |r: Result<(), FrameAbort>| {
            if let Err(e) = r {
                abort.get_or_insert(e);
            }
        };

        note(self.commit_element_under_pointer(pointer_id));

        if self.settings.compatibility_mouse_events
            && pointer_id == MOUSE_POINTER_ID
            && data.is_primary
            && !event.is_default_prevented()
        {
            let mouse_kind = match kind {
                EventKind::PointerDown => Some(EventKind::MouseDown),
                EventKind::PointerMove => Some(EventKind::MouseMove),
                EventKind::PointerUp => Some(EventKind::MouseUp),
                _ => None,
            };
            if let Some(mouse_kind) = mouse_kind {
                let mut mouse = self.acquire_event(mouse_kind, EventPayload::Pointer(data));
                mouse.set_synthesized_from(event.event_id());
                note(self.dispatch(mouse, DispatchMode::Queued));
            }
        }

        match kind {
            EventKind::PointerMove => self.clicks.on_pointer_move(pointer_id, data.position),
            EventKind::PointerUp => {
                if let Some(click) =
                    self.clicks
                        .on_pointer_up(pointer_id, event.target(), data.position, &self.tree)
                {
                    let payload = EventPayload::Pointer(PointerData {
                        click_count: click.click_count,
                        ..data
                    });
                    let mut click_event = self.acquire_event(EventKind::Click, payload);
                    click_event.set_target(Some(click.target));
                    click_event.set_synthesized_from(event.event_id());
                    note(self.dispatch(click_event, DispatchMode::Queued));
                }
            }
            EventKind::PointerCancel => self.clicks.on_pointer_cancel(pointer_id),
            _ => {}
        }

        let released = kind == EventKind::PointerCancel
            || (kind == EventKind::PointerUp && data.pressed_buttons.is_empty());
        if released {
            self.release_all_captures(pointer_id);
        }
        note(self.process_pending_pointer_capture(pointer_id));

        abort.map_or(Ok(()), Err)
    }

    /// Turn the pending hover change of `pointer_id` into events and `HOVER` states.
    pub(crate) fn commit_element_under_pointer(&mut self, pointer_id: u32) -> Result<(), FrameAbort> {
        let Some(transition) = self.under_pointer.commit(pointer_id, &self.tree) else {
            return Ok(());
        };
        for &left in &transition.leave {
            self.set_pseudo_state(left, PseudoStates::HOVER, false);
        }
        for &entered in &transition.enter {
            self.set_pseudo_state(entered, PseudoStates::HOVER, true);
        }

        let mouse = self.settings.compatibility_mouse_events && pointer_id == MOUSE_POINTER_ID;
        let mut sequence = Vec::new();
        let mut push = |kind: EventKind, mouse_kind: EventKind, target: ElementId| {
            sequence.push((kind, target));
            if mouse {
                sequence.push((mouse_kind, target));
            }
        };
        if let Some(previous) = transition.previous {
            push(EventKind::PointerOut, EventKind::MouseOut, previous);
        }
        for &left in &transition.leave {
            push(EventKind::PointerLeave, EventKind::MouseLeave, left);
        }
        for &entered in &transition.enter {
            push(EventKind::PointerEnter, EventKind::MouseEnter, entered);
        }
        if let Some(current) = transition.current {
            push(EventKind::PointerOver, EventKind::MouseOver, current);
        }

        let data = hover_data(pointer_id, transition.position);
        let mut abort = None;
        for (kind, target) in sequence {
            if let Err(e) = self.send_event(kind, EventPayload::Pointer(data), Some(target)) {
                abort.get_or_insert(e);
            }
        }
        abort.map_or(Ok(()), Err)
    }
}

fn hover_data(pointer_id: u32, position: Point) -> PointerData {
    PointerData {
        pointer_id,
        pointer_type: pointer_type_of(pointer_id),
        position,
        local_position: position,
        ..PointerData::default()
    }
}

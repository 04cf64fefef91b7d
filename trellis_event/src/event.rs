// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The event record and its payloads.

use kurbo::{Point, Rect, Vec2};
use smallvec::SmallVec;
use trellis_tree::ElementId;

/// Root→target list of elements an event travels through, computed once per dispatch.
pub type PropagationPath = SmallVec<[ElementId; 16]>;

/// Stable numeric identity of an event type, used to key callback registrations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventTypeId(pub u16);

/// The concrete type of an [`Event`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A pointer button was pressed.
    PointerDown,
    /// A pointer moved.
    PointerMove,
    /// A pointer button was released.
    PointerUp,
    /// The platform canceled the pointer interaction.
    PointerCancel,
    /// The pointer entered an element or one of its descendants.
    PointerEnter,
    /// The pointer left an element and all of its descendants.
    PointerLeave,
    /// The pointer moved onto an element.
    PointerOver,
    /// The pointer moved off an element.
    PointerOut,
    /// An element acquired pointer capture.
    PointerCapture,
    /// An element lost pointer capture.
    PointerCaptureOut,
    /// Compatibility mouse event derived from [`EventKind::PointerDown`].
    MouseDown,
    /// Compatibility mouse event derived from [`EventKind::PointerMove`].
    MouseMove,
    /// Compatibility mouse event derived from [`EventKind::PointerUp`].
    MouseUp,
    /// Mouse equivalent of [`EventKind::PointerEnter`].
    MouseEnter,
    /// Mouse equivalent of [`EventKind::PointerLeave`].
    MouseLeave,
    /// Mouse equivalent of [`EventKind::PointerOver`].
    MouseOver,
    /// Mouse equivalent of [`EventKind::PointerOut`].
    MouseOut,
    /// An element acquired mouse capture.
    MouseCapture,
    /// An element lost mouse capture.
    MouseCaptureOut,
    /// A press and release on the same element (or a common ancestor).
    Click,
    /// A key was pressed.
    KeyDown,
    /// A key was released.
    KeyUp,
    /// Directional or sequential navigation was requested.
    NavigationMove,
    /// The "submit" navigation action.
    NavigationSubmit,
    /// The "cancel" navigation action.
    NavigationCancel,
    /// Focus is about to leave an element.
    FocusOut,
    /// An element lost focus.
    Blur,
    /// Focus is about to enter an element.
    FocusIn,
    /// An element gained focus.
    Focus,
    /// The resolved layout rectangle of an element changed.
    GeometryChanged,
    /// Asks whether a command can be executed.
    ValidateCommand,
    /// Executes a command.
    ExecuteCommand,
    /// Host-defined event type. The value is offset past the built-in ids.
    Custom(u16),
}

const CUSTOM_BASE: u16 = 1024;

impl EventKind {
    /// Stable identity of this event type.
    pub fn type_id(self) -> EventTypeId {
        use EventKind::*;
        let id = match self {
            PointerDown => 1,
            PointerMove => 2,
            PointerUp => 3,
            PointerCancel => 4,
            PointerEnter => 5,
            PointerLeave => 6,
            PointerOver => 7,
            PointerOut => 8,
            PointerCapture => 9,
            PointerCaptureOut => 10,
            MouseDown => 20,
            MouseMove => 21,
            MouseUp => 22,
            MouseEnter => 23,
            MouseLeave => 24,
            MouseOver => 25,
            MouseOut => 26,
            MouseCapture => 27,
            MouseCaptureOut => 28,
            Click => 40,
            KeyDown => 50,
            KeyUp => 51,
            NavigationMove => 60,
            NavigationSubmit => 61,
            NavigationCancel => 62,
            FocusOut => 70,
            Blur => 71,
            FocusIn => 72,
            Focus => 73,
            GeometryChanged => 80,
            ValidateCommand => 90,
            ExecuteCommand => 91,
            Custom(n) => CUSTOM_BASE.saturating_add(n),
        };
        EventTypeId(id)
    }

    /// Whether the event has a bubble-up phase.
    pub fn bubbles(self) -> bool {
        !matches!(
            self,
            Self::PointerEnter
                | Self::PointerLeave
                | Self::MouseEnter
                | Self::MouseLeave
                | Self::Blur
                | Self::Focus
                | Self::GeometryChanged
        )
    }

    /// Whether the event has a trickle-down phase.
    pub fn trickles_down(self) -> bool {
        !matches!(self, Self::GeometryChanged)
    }

    /// Whether propagation skips callbacks and default actions of disabled elements.
    pub fn skips_disabled_elements(self) -> bool {
        self.is_pointer()
            || self.is_mouse()
            || self.is_keyboard()
            || self.is_navigation()
            || self.is_command()
            || self == Self::Click
    }

    /// Pointer input and hover events; capture notifications are not included.
    pub fn is_pointer(self) -> bool {
        matches!(
            self,
            Self::PointerDown
                | Self::PointerMove
                | Self::PointerUp
                | Self::PointerCancel
                | Self::PointerEnter
                | Self::PointerLeave
                | Self::PointerOver
                | Self::PointerOut
        )
    }

    /// Compatibility mouse events.
    pub fn is_mouse(self) -> bool {
        matches!(
            self,
            Self::MouseDown
                | Self::MouseMove
                | Self::MouseUp
                | Self::MouseEnter
                | Self::MouseLeave
                | Self::MouseOver
                | Self::MouseOut
        )
    }

    /// Key events.
    pub fn is_keyboard(self) -> bool {
        matches!(self, Self::KeyDown | Self::KeyUp)
    }

    /// Navigation events.
    pub fn is_navigation(self) -> bool {
        matches!(
            self,
            Self::NavigationMove | Self::NavigationSubmit | Self::NavigationCancel
        )
    }

    /// Command events.
    pub fn is_command(self) -> bool {
        matches!(self, Self::ValidateCommand | Self::ExecuteCommand)
    }

    /// Focus notifications.
    pub fn is_focus(self) -> bool {
        matches!(self, Self::FocusOut | Self::Blur | Self::FocusIn | Self::Focus)
    }
}

/// The phase an event is currently in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PropagationPhase {
    /// Not being dispatched.
    #[default]
    None,
    /// Travelling from the root towards the target's parent.
    TrickleDown,
    /// At the target.
    AtTarget,
    /// The target's default action, before bubbling.
    DefaultActionAtTarget,
    /// Travelling from the target's parent back to the root.
    BubbleUp,
    /// The target's default action, after propagation.
    DefaultAction,
}

bitflags::bitflags! {
    /// Dispatch state carried by an [`Event`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EventFlags: u16 {
        /// No further element receives the event.
        const PROPAGATION_STOPPED           = 1 << 0;
        /// No further callback receives the event, not even on the current element.
        const IMMEDIATE_PROPAGATION_STOPPED = 1 << 1;
        /// Default actions are skipped.
        const DEFAULT_PREVENTED             = 1 << 2;
        /// The event went through the dispatcher.
        const DISPATCHED                    = 1 << 3;
        /// The focus controller already reacted to this event.
        const PROCESSED_BY_FOCUS_CONTROLLER = 1 << 4;
    }
}

bitflags::bitflags! {
    /// Keyboard modifiers held during an input event.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Shift.
        const SHIFT = 1 << 0;
        /// Control.
        const CTRL  = 1 << 1;
        /// Alt / Option.
        const ALT   = 1 << 2;
        /// Command / Windows.
        const META  = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Pressed pointer buttons. Bit `n` is button `n`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PointerButtons: u32 {
        /// Primary (left) button.
        const PRIMARY   = 1 << 0;
        /// Secondary (right) button.
        const SECONDARY = 1 << 1;
        /// Auxiliary (middle) button.
        const AUXILIARY = 1 << 2;
    }
}

impl PointerButtons {
    /// The flag for button number `button`.
    pub fn from_button(button: u8) -> Self {
        Self::from_bits_retain(1_u32.checked_shl(u32::from(button)).unwrap_or(0))
    }
}

/// Kind of device behind a pointer id.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointerType {
    /// A mouse.
    #[default]
    Mouse,
    /// A finger on a touch surface.
    Touch,
    /// A stylus.
    Pen,
}

/// Pointer payload for pointer, mouse and click events.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerData {
    /// Pointer id; see [`crate::pointer`] for the id ranges.
    pub pointer_id: u32,
    /// Device kind.
    pub pointer_type: PointerType,
    /// Position in surface coordinates.
    pub position: Point,
    /// Position relative to the current element's layout origin.
    pub local_position: Point,
    /// Movement since the previous sample of this pointer.
    pub delta: Vec2,
    /// The button that changed state, if any.
    pub button: Option<u8>,
    /// Buttons held after this sample.
    pub pressed_buttons: PointerButtons,
    /// Number of consecutive clicks; filled in by the click detector on down and click.
    pub click_count: u32,
    /// Normalized pressure.
    pub pressure: f32,
    /// Keyboard modifiers.
    pub modifiers: Modifiers,
    /// Whether this is the primary pointer of its device kind.
    pub is_primary: bool,
}

impl Default for PointerData {
    fn default() -> Self {
        Self {
            pointer_id: 0,
            pointer_type: PointerType::Mouse,
            position: Point::ZERO,
            local_position: Point::ZERO,
            delta: Vec2::ZERO,
            button: None,
            pressed_buttons: PointerButtons::empty(),
            click_count: 0,
            pressure: 0.0,
            modifiers: Modifiers::empty(),
            is_primary: true,
        }
    }
}

impl PointerData {
    /// Mouse pointer data at `position`.
    pub fn mouse(position: Point) -> Self {
        Self {
            position,
            local_position: position,
            ..Self::default()
        }
    }

    /// Set the changed button and mark it pressed.
    #[must_use]
    pub fn with_button(mut self, button: u8) -> Self {
        self.button = Some(button);
        self.pressed_buttons |= PointerButtons::from_button(button);
        self
    }

    /// Set the pointer id, deriving the device kind from it.
    #[must_use]
    pub fn with_pointer_id(mut self, pointer_id: u32) -> Self {
        self.pointer_id = pointer_id;
        self.pointer_type = crate::pointer::pointer_type_of(pointer_id);
        self
    }

    /// Set modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Keys the core reacts to. Everything else is passed through as [`Key::Other`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Tab.
    Tab,
    /// Enter / Return.
    Enter,
    /// Escape.
    Escape,
    /// Space bar.
    Space,
    /// Up arrow.
    ArrowUp,
    /// Down arrow.
    ArrowDown,
    /// Left arrow.
    ArrowLeft,
    /// Right arrow.
    ArrowRight,
    /// A key producing a character.
    Character(char),
    /// Any other key, by platform code.
    Other(u32),
}

/// Key payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyData {
    /// The key.
    pub key: Key,
    /// Keyboard modifiers.
    pub modifiers: Modifiers,
}

/// Direction of a navigation request.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NavigationDirection {
    /// No direction.
    #[default]
    None,
    /// Left.
    Left,
    /// Up.
    Up,
    /// Right.
    Right,
    /// Down.
    Down,
    /// Next in sequential order.
    Next,
    /// Previous in sequential order.
    Previous,
}

/// Navigation payload.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigationData {
    /// Requested direction.
    pub direction: NavigationDirection,
    /// Keyboard modifiers.
    pub modifiers: Modifiers,
}

/// How focus moved.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FocusChangeDirection {
    /// The change was not caused by navigation (programmatic or pointer).
    #[default]
    Unspecified,
    /// Explicitly no navigation.
    None,
    /// Sequential, forward.
    Next,
    /// Sequential, backward.
    Previous,
    /// Directional, left.
    Left,
    /// Directional, right.
    Right,
    /// Directional, up.
    Up,
    /// Directional, down.
    Down,
}

impl FocusChangeDirection {
    /// Returns `true` for the four spatial directions.
    pub fn is_directional(self) -> bool {
        matches!(self, Self::Left | Self::Right | Self::Up | Self::Down)
    }
}

/// Focus payload.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FocusData {
    /// The other element involved: the one gaining focus for `FocusOut`/`Blur`,
    /// the one losing it for `FocusIn`/`Focus`.
    pub related_target: Option<ElementId>,
    /// How the change was requested.
    pub direction: FocusChangeDirection,
}

/// Geometry payload.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GeometryData {
    /// Rectangle before the change.
    pub old_rect: Rect,
    /// Rectangle after the change.
    pub new_rect: Rect,
}

/// Command payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CommandData {
    /// Command name, e.g. `"Copy"`.
    pub name: &'static str,
}

/// Pointer capture payload.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CaptureData {
    /// The pointer whose capture changed.
    pub pointer_id: u32,
    /// The element on the other side of the change.
    pub related_target: Option<ElementId>,
}

/// Typed event data.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum EventPayload {
    /// No data.
    #[default]
    None,
    /// Pointer, mouse and click data.
    Pointer(PointerData),
    /// Key data.
    Key(KeyData),
    /// Navigation data.
    Navigation(NavigationData),
    /// Focus data.
    Focus(FocusData),
    /// Geometry data.
    Geometry(GeometryData),
    /// Command data.
    Command(CommandData),
    /// Capture data.
    Capture(CaptureData),
}

/// A UI event travelling through an element path.
///
/// Events are acquired from an [`EventPool`](crate::EventPool) and have exactly
/// one owner at a time: the caller, the dispatch queue, or the dispatch loop.
/// Once the stop flags are set they are never cleared for the lifetime of the
/// acquisition.
#[derive(Clone, Debug)]
pub struct Event {
    pub(crate) kind: EventKind,
    pub(crate) payload: EventPayload,
    pub(crate) target: Option<ElementId>,
    pub(crate) current_target: Option<ElementId>,
    pub(crate) path: PropagationPath,
    pub(crate) phase: PropagationPhase,
    pub(crate) flags: EventFlags,
    pub(crate) timestamp_ms: u64,
    pub(crate) event_id: u64,
    pub(crate) synthesized_from: Option<u64>,
}

impl Event {
    pub(crate) fn blank() -> Self {
        Self {
            kind: EventKind::Custom(0),
            payload: EventPayload::None,
            target: None,
            current_target: None,
            path: PropagationPath::new(),
            phase: PropagationPhase::None,
            flags: EventFlags::empty(),
            timestamp_ms: 0,
            event_id: 0,
            synthesized_from: None,
        }
    }

    /// The event type.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Shorthand for `self.kind().type_id()`.
    pub fn type_id(&self) -> EventTypeId {
        self.kind.type_id()
    }

    /// Unique id of this acquisition.
    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    /// Host timestamp in milliseconds.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// The payload.
    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// The target element.
    pub fn target(&self) -> Option<ElementId> {
        self.target
    }

    /// Set the target. Only meaningful before dispatch.
    pub fn set_target(&mut self, target: Option<ElementId>) {
        self.target = target;
    }

    /// Builder form of [`Event::set_target`].
    #[must_use]
    pub fn with_target(mut self, target: ElementId) -> Self {
        self.target = Some(target);
        self
    }

    /// The element whose callbacks are currently running.
    pub fn current_target(&self) -> Option<ElementId> {
        self.current_target
    }

    /// Set the element whose callbacks are about to run.
    pub fn set_current_target(&mut self, element: Option<ElementId>) {
        self.current_target = element;
    }

    /// The propagation path computed at dispatch, root first.
    pub fn path(&self) -> &[ElementId] {
        &self.path
    }

    /// Replace the propagation path.
    pub fn set_path(&mut self, path: &[ElementId]) {
        self.path.clear();
        self.path.extend_from_slice(path);
    }

    /// Current phase.
    pub fn phase(&self) -> PropagationPhase {
        self.phase
    }

    /// Set the current phase.
    pub fn set_phase(&mut self, phase: PropagationPhase) {
        self.phase = phase;
    }

    /// Raw dispatch flags.
    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    /// Event id of the event this one was synthesized from (compatibility mouse
    /// events, clicks, hover transitions).
    pub fn synthesized_from(&self) -> Option<u64> {
        self.synthesized_from
    }

    /// Record the event this one was derived from.
    pub fn set_synthesized_from(&mut self, event_id: u64) {
        self.synthesized_from = Some(event_id);
    }

    /// Whether this event type bubbles.
    pub fn bubbles(&self) -> bool {
        self.kind.bubbles()
    }

    /// Whether this event type trickles down.
    pub fn trickles_down(&self) -> bool {
        self.kind.trickles_down()
    }

    /// Whether disabled elements are skipped.
    pub fn skips_disabled_elements(&self) -> bool {
        self.kind.skips_disabled_elements()
    }

    /// Stop propagation to further elements.
    pub fn stop_propagation(&mut self) {
        self.flags |= EventFlags::PROPAGATION_STOPPED;
    }

    /// Stop propagation to further callbacks, including the current element's.
    pub fn stop_immediate_propagation(&mut self) {
        self.flags |= EventFlags::PROPAGATION_STOPPED | EventFlags::IMMEDIATE_PROPAGATION_STOPPED;
    }

    /// Skip default actions.
    pub fn prevent_default(&mut self) {
        self.flags |= EventFlags::DEFAULT_PREVENTED;
    }

    /// See [`Event::stop_propagation`].
    pub fn is_propagation_stopped(&self) -> bool {
        self.flags.contains(EventFlags::PROPAGATION_STOPPED)
    }

    /// See [`Event::stop_immediate_propagation`].
    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.flags
            .contains(EventFlags::IMMEDIATE_PROPAGATION_STOPPED)
    }

    /// See [`Event::prevent_default`].
    pub fn is_default_prevented(&self) -> bool {
        self.flags.contains(EventFlags::DEFAULT_PREVENTED)
    }

    /// Whether the event went through a dispatcher.
    pub fn is_dispatched(&self) -> bool {
        self.flags.contains(EventFlags::DISPATCHED)
    }

    /// Mark the event as dispatched.
    pub fn mark_dispatched(&mut self) {
        self.flags |= EventFlags::DISPATCHED;
    }

    /// Whether the focus controller already handled this event.
    pub fn processed_by_focus_controller(&self) -> bool {
        self.flags
            .contains(EventFlags::PROCESSED_BY_FOCUS_CONTROLLER)
    }

    /// Record that the focus controller handled this event.
    pub fn mark_processed_by_focus_controller(&mut self) {
        self.flags |= EventFlags::PROCESSED_BY_FOCUS_CONTROLLER;
    }

    /// Pointer data, for pointer, mouse and click events.
    pub fn pointer(&self) -> Option<&PointerData> {
        match &self.payload {
            EventPayload::Pointer(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable pointer data.
    pub fn pointer_mut(&mut self) -> Option<&mut PointerData> {
        match &mut self.payload {
            EventPayload::Pointer(p) => Some(p),
            _ => None,
        }
    }

    /// Key data.
    pub fn key(&self) -> Option<&KeyData> {
        match &self.payload {
            EventPayload::Key(k) => Some(k),
            _ => None,
        }
    }

    /// Navigation data.
    pub fn navigation(&self) -> Option<&NavigationData> {
        match &self.payload {
            EventPayload::Navigation(n) => Some(n),
            _ => None,
        }
    }

    /// Focus data.
    pub fn focus(&self) -> Option<&FocusData> {
        match &self.payload {
            EventPayload::Focus(f) => Some(f),
            _ => None,
        }
    }

    /// Geometry data.
    pub fn geometry(&self) -> Option<&GeometryData> {
        match &self.payload {
            EventPayload::Geometry(g) => Some(g),
            _ => None,
        }
    }

    /// Command data.
    pub fn command(&self) -> Option<&CommandData> {
        match &self.payload {
            EventPayload::Command(c) => Some(c),
            _ => None,
        }
    }

    /// Capture data.
    pub fn capture(&self) -> Option<&CaptureData> {
        match &self.payload {
            EventPayload::Capture(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_flags_are_monotonic() {
        let mut ev = Event::blank();
        ev.stop_immediate_propagation();
        assert!(ev.is_propagation_stopped());
        assert!(ev.is_immediate_propagation_stopped());
        ev.stop_propagation();
        ev.prevent_default();
        assert!(ev.is_immediate_propagation_stopped());
        assert!(ev.is_default_prevented());
    }

    #[test]
    fn type_ids_are_distinct() {
        let kinds = [
            EventKind::PointerDown,
            EventKind::MouseDown,
            EventKind::Click,
            EventKind::Focus,
            EventKind::GeometryChanged,
            EventKind::Custom(0),
            EventKind::Custom(1),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a.type_id(), b.type_id());
            }
        }
    }

    #[test]
    fn enter_leave_do_not_bubble() {
        assert!(!EventKind::PointerEnter.bubbles());
        assert!(EventKind::PointerEnter.trickles_down());
        assert!(EventKind::PointerOver.bubbles());
        assert!(!EventKind::Focus.bubbles());
        assert!(EventKind::FocusIn.bubbles());
        assert!(!EventKind::GeometryChanged.trickles_down());
    }

    #[test]
    fn button_flags() {
        assert_eq!(PointerButtons::from_button(0), PointerButtons::PRIMARY);
        assert_eq!(PointerButtons::from_button(2), PointerButtons::AUXILIARY);
        assert_eq!(PointerButtons::from_button(40), PointerButtons::empty());
        let p = PointerData::mouse(Point::new(1.0, 2.0)).with_button(1);
        assert_eq!(p.button, Some(1));
        assert!(p.pressed_buttons.contains(PointerButtons::SECONDARY));
    }
}

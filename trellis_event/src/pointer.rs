// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-pointer device state shared by every surface of a process.
//!
//! Pointer ids are partitioned by device kind:
//!
//! | Ids        | Device |
//! |------------|--------|
//! | `0`        | mouse  |
//! | `1..=20`   | touch  |
//! | `21..=22`  | pen    |
//!
//! The state is owned by the host and shared with each surface as a
//! [`SharedPointerState`]. A surface that goes away must call
//! [`PointerDeviceState::remove_surface`] so no entry keeps pointing at it.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::Point;

use crate::event::{PointerButtons, PointerType};

/// Id of the mouse pointer.
pub const MOUSE_POINTER_ID: u32 = 0;
/// First touch pointer id.
pub const TOUCH_POINTER_ID_BASE: u32 = 1;
/// Number of touch pointer ids.
pub const TOUCH_POINTER_COUNT: u32 = 20;
/// First pen pointer id.
pub const PEN_POINTER_ID_BASE: u32 = TOUCH_POINTER_ID_BASE + TOUCH_POINTER_COUNT;
/// Number of pen pointer ids.
pub const PEN_POINTER_COUNT: u32 = 2;
/// Size of per-pointer tables. Ids at or above this are ignored.
pub const MAX_POINTERS: u32 = 32;

/// Device kind for a pointer id.
pub fn pointer_type_of(pointer_id: u32) -> PointerType {
    if (TOUCH_POINTER_ID_BASE..PEN_POINTER_ID_BASE).contains(&pointer_id) {
        PointerType::Touch
    } else if (PEN_POINTER_ID_BASE..PEN_POINTER_ID_BASE + PEN_POINTER_COUNT).contains(&pointer_id) {
        PointerType::Pen
    } else {
        PointerType::Mouse
    }
}

/// Identity of a surface (a window or panel) for pointer bookkeeping.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

#[derive(Copy, Clone, Debug, Default, PartialEq)]
struct PointerEntry {
    position: Point,
    pressed_buttons: PointerButtons,
    surface: Option<SurfaceId>,
    outside_surface: bool,
}

/// Last known state of every pointer.
#[derive(Clone, Debug)]
pub struct PointerDeviceState {
    entries: [PointerEntry; MAX_POINTERS as usize],
}

/// The pointer state as shared between surfaces of one thread.
pub type SharedPointerState = Rc<RefCell<PointerDeviceState>>;

impl Default for PointerDeviceState {
    fn default() -> Self {
        Self {
            entries: [PointerEntry::default(); MAX_POINTERS as usize],
        }
    }
}

impl PointerDeviceState {
    /// Create a state with every pointer at the origin, no buttons, no surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state wrapped for sharing.
    pub fn shared() -> SharedPointerState {
        Rc::new(RefCell::new(Self::new()))
    }

    fn entry(&self, pointer_id: u32) -> Option<&PointerEntry> {
        self.entries.get(pointer_id as usize)
    }

    fn entry_mut(&mut self, pointer_id: u32) -> Option<&mut PointerEntry> {
        let entry = self.entries.get_mut(pointer_id as usize);
        if entry.is_none() {
            tracing::warn!(pointer_id, "pointer id out of range");
        }
        entry
    }

    /// Record the position of a pointer and the surface it was sampled on.
    pub fn save_pointer_position(&mut self, pointer_id: u32, position: Point, surface: Option<SurfaceId>) {
        if let Some(e) = self.entry_mut(pointer_id) {
            e.position = position;
            e.surface = surface;
        }
    }

    /// Last recorded position.
    pub fn position(&self, pointer_id: u32) -> Point {
        self.entry(pointer_id).map_or(Point::ZERO, |e| e.position)
    }

    /// Surface the pointer was last sampled on.
    pub fn surface(&self, pointer_id: u32) -> Option<SurfaceId> {
        self.entry(pointer_id).and_then(|e| e.surface)
    }

    /// Mark `button` as pressed.
    pub fn press_button(&mut self, pointer_id: u32, button: u8) {
        if let Some(e) = self.entry_mut(pointer_id) {
            e.pressed_buttons |= PointerButtons::from_button(button);
        }
    }

    /// Mark `button` as released.
    pub fn release_button(&mut self, pointer_id: u32, button: u8) {
        if let Some(e) = self.entry_mut(pointer_id) {
            e.pressed_buttons -= PointerButtons::from_button(button);
        }
    }

    /// Release every button of a pointer.
    pub fn release_all_buttons(&mut self, pointer_id: u32) {
        if let Some(e) = self.entry_mut(pointer_id) {
            e.pressed_buttons = PointerButtons::empty();
        }
    }

    /// Buttons currently held.
    pub fn pressed_buttons(&self, pointer_id: u32) -> PointerButtons {
        self.entry(pointer_id)
            .map_or(PointerButtons::empty(), |e| e.pressed_buttons)
    }

    /// Whether buttons other than `button` are held.
    pub fn has_additional_pressed_buttons(&self, pointer_id: u32, button: u8) -> bool {
        !(self.pressed_buttons(pointer_id) - PointerButtons::from_button(button)).is_empty()
    }

    /// Record whether the pointer left its surface.
    pub fn set_outside_surface(&mut self, pointer_id: u32, outside: bool) {
        if let Some(e) = self.entry_mut(pointer_id) {
            e.outside_surface = outside;
        }
    }

    /// Whether the pointer is outside its surface.
    pub fn is_outside_surface(&self, pointer_id: u32) -> bool {
        self.entry(pointer_id).is_some_and(|e| e.outside_surface)
    }

    /// Forget every reference to `surface`.
    pub fn remove_surface(&mut self, surface: SurfaceId) {
        let mut cleared = 0_u32;
        for e in &mut self.entries {
            if e.surface == Some(surface) {
                e.surface = None;
                e.outside_surface = false;
                cleared += 1;
            }
        }
        if cleared > 0 {
            tracing::debug!(?surface, cleared, "surface removed from pointer state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_ranges() {
        assert_eq!(pointer_type_of(MOUSE_POINTER_ID), PointerType::Mouse);
        assert_eq!(pointer_type_of(1), PointerType::Touch);
        assert_eq!(pointer_type_of(20), PointerType::Touch);
        assert_eq!(pointer_type_of(21), PointerType::Pen);
        assert_eq!(pointer_type_of(22), PointerType::Pen);
    }

    #[test]
    fn buttons_and_positions() {
        let mut s = PointerDeviceState::new();
        s.save_pointer_position(3, Point::new(4.0, 5.0), Some(SurfaceId(1)));
        s.press_button(3, 0);
        s.press_button(3, 1);
        assert_eq!(s.position(3), Point::new(4.0, 5.0));
        assert!(s.has_additional_pressed_buttons(3, 0));
        s.release_button(3, 1);
        assert!(!s.has_additional_pressed_buttons(3, 0));
        assert_eq!(s.pressed_buttons(3), PointerButtons::PRIMARY);
    }

    #[test]
    fn out_of_range_ids_are_ignored() {
        let mut s = PointerDeviceState::new();
        s.press_button(99, 0);
        assert_eq!(s.pressed_buttons(99), PointerButtons::empty());
        assert_eq!(s.position(99), Point::ZERO);
    }

    #[test]
    fn remove_surface_clears_only_matching_entries() {
        let shared = PointerDeviceState::shared();
        {
            let mut s = shared.borrow_mut();
            s.save_pointer_position(0, Point::ZERO, Some(SurfaceId(1)));
            s.save_pointer_position(1, Point::ZERO, Some(SurfaceId(2)));
            s.set_outside_surface(0, true);
        }
        shared.borrow_mut().remove_surface(SurfaceId(1));
        let s = shared.borrow();
        assert_eq!(s.surface(0), None);
        assert!(!s.is_outside_surface(0));
        assert_eq!(s.surface(1), Some(SurfaceId(2)));
    }
}

// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Click and multi-click recognition.
//!
//! ## Usage
//!
//! 1) On pointer down, call [`ClickDetector::on_pointer_down`]; stamp the returned
//!    count on the down event.
//! 2) On pointer move, call [`ClickDetector::on_pointer_move`].
//! 3) On pointer up, call [`ClickDetector::on_pointer_up`]; if it returns a
//!    [`Click`], send a click event to its target.
//! 4) On pointer cancel, call [`ClickDetector::on_pointer_cancel`].
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::{Point, Rect};
//! use trellis_event::click::{ClickDetector, ClickSettings};
//! use trellis_tree::{ElementProps, ElementTree};
//!
//! let mut tree = ElementTree::new();
//! let button = tree.insert(None, ElementProps::at(Rect::new(0.0, 0.0, 50.0, 20.0)));
//! let mut clicks = ClickDetector::new(ClickSettings::default());
//! let at = Point::new(10.0, 10.0);
//!
//! assert_eq!(clicks.on_pointer_down(0, button, at, 0, &tree), 1);
//! assert_eq!(clicks.on_pointer_up(0, Some(button), at, &tree).unwrap().click_count, 1);
//! assert_eq!(clicks.on_pointer_down(0, button, at, 60, &tree), 2);
//! ```

use kurbo::Point;
use trellis_tree::{ElementId, ElementTree};

use crate::pointer::MAX_POINTERS;

/// Click recognition settings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClickSettings {
    /// Maximum time between two pointer downs for them to count as a multi-click.
    pub double_click_time_ms: u64,
    /// Maximum distance between two pointer downs of a multi-click.
    pub move_tolerance: f64,
}

impl Default for ClickSettings {
    fn default() -> Self {
        Self {
            double_click_time_ms: 500,
            move_tolerance: 4.0,
        }
    }
}

/// Click state of one pointer.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ClickStatus {
    /// Element the last pointer down hit.
    pub target: Option<ElementId>,
    /// Time of the last pointer down.
    pub last_pointer_down_ms: u64,
    /// Consecutive clicks so far, `0` when nothing is tracked.
    pub click_count: u32,
    /// Position of the last pointer down.
    pub pointer_down_position: Point,
}

impl ClickStatus {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A recognized click.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Click {
    /// Lowest common ancestor of the down and up targets.
    pub target: ElementId,
    /// Consecutive click count, starting at `1`.
    pub click_count: u32,
}

/// Per-pointer click state machine.
#[derive(Clone, Debug)]
pub struct ClickDetector {
    statuses: [ClickStatus; MAX_POINTERS as usize],
    settings: ClickSettings,
}

impl Default for ClickDetector {
    fn default() -> Self {
        Self::new(ClickSettings::default())
    }
}

fn contains_pointer(tree: &ElementTree, element: ElementId, position: Point) -> bool {
    tree.is_visible_in_hierarchy(element)
        && tree
            .layout(element)
            .is_some_and(|r| r.contains(position))
}

impl ClickDetector {
    /// Create a detector.
    pub fn new(settings: ClickSettings) -> Self {
        Self {
            statuses: [ClickStatus::default(); MAX_POINTERS as usize],
            settings,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &ClickSettings {
        &self.settings
    }

    /// Replace the settings. Tracked state is kept.
    pub fn set_settings(&mut self, settings: ClickSettings) {
        self.settings = settings;
    }

    /// State of one pointer.
    pub fn status(&self, pointer_id: u32) -> Option<&ClickStatus> {
        self.statuses.get(pointer_id as usize)
    }

    /// Handle a pointer down on `target`. Returns the click count to report on the
    /// down event, or `0` when the pointer is not inside the target.
    pub fn on_pointer_down(
        &mut self,
        pointer_id: u32,
        target: ElementId,
        position: Point,
        timestamp_ms: u64,
        tree: &ElementTree,
    ) -> u32 {
        let settings = self.settings;
        let Some(status) = self.statuses.get_mut(pointer_id as usize) else {
            return 0;
        };
        if !contains_pointer(tree, target, position) {
            status.reset();
            return 0;
        }
        let continues = status.click_count > 0
            && status.target == Some(target)
            && timestamp_ms.saturating_sub(status.last_pointer_down_ms) <= settings.double_click_time_ms
            && (position - status.pointer_down_position).hypot() <= settings.move_tolerance;
        status.click_count = if continues { status.click_count + 1 } else { 1 };
        status.target = Some(target);
        status.last_pointer_down_ms = timestamp_ms;
        status.pointer_down_position = position;
        status.click_count
    }

    /// Handle a pointer move. Moving further than the tolerance from the down
    /// position ends the multi-click sequence, but not the pending click.
    pub fn on_pointer_move(&mut self, pointer_id: u32, position: Point) {
        let tolerance = self.settings.move_tolerance;
        if let Some(status) = self.statuses.get_mut(pointer_id as usize) {
            if status.target.is_some()
                && (position - status.pointer_down_position).hypot() > tolerance
            {
                status.last_pointer_down_ms = 0;
                status.pointer_down_position = Point::new(f64::INFINITY, f64::INFINITY);
            }
        }
    }

    /// Handle a pointer up on `target`.
    ///
    /// Returns the click to send, targeted at the lowest common ancestor of the
    /// down and up targets, if that ancestor still contains the pointer.
    pub fn on_pointer_up(
        &mut self,
        pointer_id: u32,
        target: Option<ElementId>,
        position: Point,
        tree: &ElementTree,
    ) -> Option<Click> {
        let status = self.statuses.get_mut(pointer_id as usize)?;
        let (Some(down_target), Some(up_target)) = (status.target, target) else {
            status.reset();
            return None;
        };
        if status.click_count == 0 || !tree.is_alive(down_target) {
            status.reset();
            return None;
        }
        match tree.common_ancestor(down_target, up_target) {
            Some(ancestor) if contains_pointer(tree, ancestor, position) => Some(Click {
                target: ancestor,
                click_count: status.click_count,
            }),
            _ => {
                status.reset();
                None
            }
        }
    }

    /// Handle a pointer cancel.
    pub fn on_pointer_cancel(&mut self, pointer_id: u32) {
        if let Some(status) = self.statuses.get_mut(pointer_id as usize) {
            status.reset();
        }
    }

    /// Forget clicks tracked on `removed` elements.
    pub fn cleanup(&mut self, removed: &[ElementId]) {
        for status in &mut self.statuses {
            if status.target.is_some_and(|t| removed.contains(&t)) {
                status.reset();
            }
        }
    }
}

// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag threshold protocol: a drag only starts once the pointer moved far enough.
//!
//! ## Usage
//!
//! 1) On a qualifying pointer down, call [`DragState::start`]; the state becomes
//!    [`DragPhase::CanStartDrag`].
//! 2) On each move, call [`DragState::update`]. Once the pointer moved at least the
//!    threshold along either axis it returns [`DragUpdate::Started`] exactly once,
//!    then [`DragUpdate::Moved`] with the delta since the previous update.
//! 3) Call [`DragState::end`] on pointer up or cancel.
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::{Point, Vec2};
//! use trellis_event::drag::{DragPhase, DragState, DragUpdate};
//!
//! let mut drag = DragState::new(5.0);
//! drag.start(Point::new(10.0, 20.0));
//!
//! // Under the threshold on both axes: nothing happens.
//! assert_eq!(drag.update(Point::new(14.0, 24.0)), DragUpdate::Pending);
//! assert_eq!(drag.phase(), DragPhase::CanStartDrag);
//!
//! // Five pixels on one axis starts the drag.
//! assert_eq!(drag.update(Point::new(15.0, 20.0)), DragUpdate::Started { offset: Vec2::new(5.0, 0.0) });
//! assert_eq!(drag.update(Point::new(17.0, 21.0)), DragUpdate::Moved { delta: Vec2::new(2.0, 1.0) });
//! assert_eq!(drag.total_offset(Point::new(17.0, 21.0)), Some(Vec2::new(7.0, 1.0)));
//! ```

use kurbo::{Point, Vec2};

/// Default drag threshold in pixels.
pub const DEFAULT_DRAG_THRESHOLD: f64 = 5.0;

/// Where a drag interaction stands.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DragPhase {
    /// No pointer is down.
    #[default]
    None,
    /// A pointer is down but has not moved past the threshold.
    CanStartDrag,
    /// The drag is in progress.
    Dragging,
}

/// Result of [`DragState::update`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DragUpdate {
    /// No drag is tracked.
    Idle,
    /// Still under the threshold.
    Pending,
    /// The threshold was just crossed. `offset` is the total movement from the start.
    Started {
        /// Movement since [`DragState::start`].
        offset: Vec2,
    },
    /// The drag continued.
    Moved {
        /// Movement since the previous update.
        delta: Vec2,
    },
}

/// Tracks the drag threshold and movement of one pointer.
#[derive(Debug, Clone, Copy)]
pub struct DragState {
    start_pos: Option<Point>,
    last_pos: Option<Point>,
    phase: DragPhase,
    threshold: f64,
}

impl Default for DragState {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_THRESHOLD)
    }
}

impl DragState {
    /// Create a tracker with the given threshold in pixels.
    pub fn new(threshold: f64) -> Self {
        Self {
            start_pos: None,
            last_pos: None,
            phase: DragPhase::None,
            threshold,
        }
    }

    /// The threshold in pixels.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Current phase.
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    /// Position of the pointer down that started tracking.
    pub fn start_position(&self) -> Option<Point> {
        self.start_pos
    }

    /// Start tracking from `pos`.
    pub fn start(&mut self, pos: Point) {
        self.start_pos = Some(pos);
        self.last_pos = Some(pos);
        self.phase = DragPhase::CanStartDrag;
    }

    /// Feed a new pointer position.
    pub fn update(&mut self, pos: Point) -> DragUpdate {
        let (Some(start), Some(last)) = (self.start_pos, self.last_pos) else {
            return DragUpdate::Idle;
        };
        match self.phase {
            DragPhase::None => DragUpdate::Idle,
            DragPhase::CanStartDrag => {
                let offset = pos - start;
                if offset.x.abs() >= self.threshold || offset.y.abs() >= self.threshold {
                    self.phase = DragPhase::Dragging;
                    self.last_pos = Some(pos);
                    tracing::debug!(?offset, "drag started");
                    DragUpdate::Started { offset }
                } else {
                    DragUpdate::Pending
                }
            }
            DragPhase::Dragging => {
                self.last_pos = Some(pos);
                DragUpdate::Moved { delta: pos - last }
            }
        }
    }

    /// Total offset from the start position.
    pub fn total_offset(&self, current_pos: Point) -> Option<Vec2> {
        self.start_pos.map(|start| current_pos - start)
    }

    /// Stop tracking.
    pub fn end(&mut self) {
        self.start_pos = None;
        self.last_pos = None;
        self.phase = DragPhase::None;
    }

    /// Returns `true` once the threshold was crossed.
    pub fn is_dragging(&self) -> bool {
        self.phase == DragPhase::Dragging
    }
}

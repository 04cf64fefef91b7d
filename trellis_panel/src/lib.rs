// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Panel: a retained-mode event surface over an element tree.
//!
//! A [`Panel`] owns an [`ElementTree`](trellis_tree::ElementTree) and runs every
//! event through the same pipeline:
//!
//! 1. Bookkeeping: pointer positions and buttons, hover picks, pending pointer
//!    captures, focus commits for `Blur`/`Focus`.
//! 2. Aiming: dispatch strategies, in order pointer capture, mouse capture,
//!    keyboard, pointer, mouse, command, and finally the explicit target.
//! 3. Propagation along the root→target path: trickle-down, at target, default
//!    action at target, bubble-up, default action.
//! 4. The focus controller reacts to `Tab`, navigation moves and pointer downs
//!    unless the default was prevented.
//! 5. Derived events: hover transitions, compatibility mouse events, clicks.
//!
//! Events sent while another one is processed are queued and run once it is
//! done, so callbacks never re-enter the pipeline unless they ask for
//! [`DispatchMode::Immediate`](trellis_event::DispatchMode::Immediate).
//!
//! ## Example
//!
//! ```
//! use kurbo::{Point, Rect};
//! use trellis_event::{EventKind, PointerData};
//! use trellis_panel::{Panel, PanelSettings};
//! use trellis_tree::ElementProps;
//!
//! let mut panel = Panel::new(Vec::new(), PanelSettings::default());
//! let root = panel.insert(None, ElementProps::at(Rect::new(0.0, 0.0, 200.0, 100.0)));
//! let button = panel.insert(Some(root), ElementProps::focusable(Rect::new(10.0, 10.0, 90.0, 40.0)));
//!
//! panel.on(button, EventKind::Click, |event, panel| {
//!     let count = event.pointer().map_or(0, |p| p.click_count);
//!     panel.state.push(count);
//!     Ok(())
//! });
//!
//! let at = PointerData::mouse(Point::new(20.0, 20.0)).with_button(0);
//! panel.pointer_down(at).unwrap();
//! panel.pointer_up(at).unwrap();
//!
//! assert_eq!(panel.state, [1]);
//! assert!(panel.is_focused(button));
//! ```

mod capture;
mod default_action;
mod dirty;
mod focus;
mod input;
mod panel;
mod propagation;
mod settings;
mod strategy;

pub use default_action::DefaultActionHandler;
pub use panel::{Panel, PanelCallback};
pub use settings::{FocusRingKind, PanelSettings};

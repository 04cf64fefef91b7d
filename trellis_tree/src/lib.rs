// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Tree: the element arena shared by the Trellis event and list crates.
//!
//! ## Overview
//!
//! [`ElementTree`] stores a strict single-owner hierarchy of elements addressed by
//! generational [`ElementId`] handles. Everything else in Trellis (pointer state,
//! click tracking, focus chains, hover caches) keeps `ElementId`s as weak
//! references and checks [`ElementTree::is_alive`] before acting on them.
//!
//! Each element carries:
//!
//! - [`ElementFlags`]: focusable, composite root, content container, disabled, hidden, …
//! - a tab index for sequential navigation,
//! - [`PseudoStates`] (`HOVER`, `ACTIVE`, `FOCUS`, …) maintained by the event pipeline,
//! - a [`PickingMode`],
//! - resolved world-space geometry written by an external layout provider.
//!
//! ## Not a layout engine
//!
//! The tree never measures or arranges anything. Hosts write resolved rectangles
//! with [`ElementTree::set_layout`], which reports the previous rectangle only when
//! it actually changed (and ignores NaN rectangles produced by early layout passes).
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::{Point, Rect};
//! use trellis_tree::{ElementProps, ElementTree};
//!
//! let mut tree = ElementTree::new();
//! let root = tree.insert(None, ElementProps::at(Rect::new(0.0, 0.0, 100.0, 100.0)));
//! let button = tree.insert(Some(root), ElementProps::focusable(Rect::new(10.0, 10.0, 50.0, 30.0)));
//!
//! assert_eq!(tree.pick(Point::new(20.0, 20.0)), Some(button));
//! assert_eq!(tree.path_to(button).as_slice(), &[root, button]);
//!
//! // Removing returns the whole subtree so side tables can be purged.
//! assert_eq!(tree.remove(button), vec![button]);
//! assert!(!tree.is_alive(button));
//! ```

mod tree;
mod types;

pub use tree::{ElementPath, ElementTree};
pub use types::{ElementFlags, ElementId, ElementProps, PickingMode, PseudoStates};

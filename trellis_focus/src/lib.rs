// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Focus: focus rings and the focused-element chain.
//!
//! This crate decides *where* focus goes. Dispatching the resulting
//! focus-out/blur/focus-in/focus events is left to the panel that owns the tree.
//!
//! - [`FocusRing`]: maps an input event to a [`FocusChangeDirection`] and a
//!   direction to the next element.
//! - [`TabOrderFocusRing`]: sequential order by tab index, with composite roots
//!   and content containers forming nested scopes.
//! - [`NavigateFocusRing`]: spatial order for arrow keys and gamepads, falling
//!   back to the tab order for sequential moves.
//! - [`FocusedElementChain`]: committed focus per composite scope plus the
//!   pending-change counter.
//!
//! ## Example
//!
//! ```
//! use kurbo::Rect;
//! use trellis_focus::{FocusChangeDirection, FocusRing, TabOrderFocusRing};
//! use trellis_tree::{ElementProps, ElementTree};
//!
//! let mut tree = ElementTree::new();
//! let root = tree.insert(None, ElementProps::at(Rect::new(0.0, 0.0, 100.0, 100.0)));
//! let a = tree.insert(Some(root), ElementProps::focusable(Rect::new(0.0, 0.0, 10.0, 10.0)));
//! let b = tree.insert(
//!     Some(root),
//!     ElementProps::focusable(Rect::new(20.0, 0.0, 30.0, 10.0)).with_tab_index(1),
//! );
//!
//! // Positive tab indices come first; zero sorts last.
//! let mut ring = TabOrderFocusRing::default();
//! assert_eq!(ring.next_focusable(&tree, None, FocusChangeDirection::Next), Some(b));
//! assert_eq!(ring.next_focusable(&tree, Some(b), FocusChangeDirection::Next), Some(a));
//! ```

mod chain;
mod navigate;
mod ring;
mod tab;

pub use chain::{FocusedElement, FocusedElementChain};
pub use navigate::NavigateFocusRing;
pub use ring::{
    APPROXIMATELY_ABSOLUTE, APPROXIMATELY_RELATIVE, FocusRing, approximately, focus_delegate,
    focusable_parent_for_pointer,
};
pub use tab::{DefaultFocusOrder, TabOrderFocusRing};
pub use trellis_event::FocusChangeDirection;

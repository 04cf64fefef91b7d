// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the element tree: identifiers, flags, pseudo states, and element properties.

use kurbo::Rect;

/// Identifier for an element in an [`ElementTree`](crate::ElementTree).
///
/// This is a small, copyable handle that stays stable across updates but becomes
/// invalid when the underlying slot is reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `ElementId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `ElementId`.
///
/// Cross-cutting tables (hover, click, focus, capture) store `ElementId`s as weak
/// references. Use [`ElementTree::is_alive`](crate::ElementTree::is_alive) before
/// acting on one; a stale id never aliases a different live element because the
/// generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u32, pub(crate) u32);

impl ElementId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Slot index of this id. Only meaningful together with [`ElementId::generation`].
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Generation of the slot this id was issued for.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// Structural and interaction flags of an element.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u16 {
        /// The element can receive keyboard focus.
        const FOCUSABLE                = 1 << 0;
        /// The element is the root of a composite control; it forms its own focus scope.
        const COMPOSITE_ROOT           = 1 << 1;
        /// The element is its parent's content container (a "slot" for user children).
        const CONTENT_CONTAINER        = 1 << 2;
        /// The element is disabled. Descendants are disabled in hierarchy as well.
        const DISABLED                 = 1 << 3;
        /// Focus requests on this element are forwarded to its first focusable descendant.
        const DELEGATES_FOCUS          = 1 << 4;
        /// The element is skipped by sequential (tab) navigation even when focusable.
        const EXCLUDED_FROM_FOCUS_RING = 1 << 5;
        /// The element is not displayed. Hidden elements are not picked nor focused.
        const HIDDEN                   = 1 << 6;
    }
}

impl Default for ElementFlags {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags::bitflags! {
    /// Interaction pseudo states, used by styling to select `:hover`, `:focus` and friends.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct PseudoStates: u8 {
        /// A pointer button is held down on the element.
        const ACTIVE   = 1 << 0;
        /// A pointer is over the element or one of its descendants.
        const HOVER    = 1 << 1;
        /// The element is checked (toggles, selected rows).
        const CHECKED  = 1 << 2;
        /// The element is disabled in hierarchy.
        const DISABLED = 1 << 3;
        /// The element has keyboard focus.
        const FOCUS    = 1 << 4;
        /// The element is the root of its tree.
        const ROOT     = 1 << 5;
    }
}

/// Whether an element participates in picking.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PickingMode {
    /// The element is picked when its layout rectangle contains the point.
    #[default]
    Position,
    /// The element is never picked itself; its children still are.
    Ignore,
}

/// Per-element properties supplied when inserting into the tree.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementProps {
    /// Optional debug name.
    pub name: Option<&'static str>,
    /// Structural and interaction flags.
    pub flags: ElementFlags,
    /// Sequential navigation index. Negative removes the element from the focus ring,
    /// zero places it after every positive index in discovery order.
    pub tab_index: i32,
    /// Picking behavior.
    pub picking_mode: PickingMode,
    /// Resolved world-space layout rectangle, supplied by the layout provider.
    pub layout: Rect,
}

impl Default for ElementProps {
    fn default() -> Self {
        Self {
            name: None,
            flags: ElementFlags::empty(),
            tab_index: 0,
            picking_mode: PickingMode::Position,
            layout: Rect::ZERO,
        }
    }
}

impl ElementProps {
    /// Properties of a plain focusable element at `layout`.
    pub fn focusable(layout: Rect) -> Self {
        Self {
            flags: ElementFlags::FOCUSABLE,
            layout,
            ..Self::default()
        }
    }

    /// Properties of a plain, non-focusable element at `layout`.
    pub fn at(layout: Rect) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Set the debug name.
    #[must_use]
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Add flags.
    #[must_use]
    pub fn with_flags(mut self, flags: ElementFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Set the tab index.
    #[must_use]
    pub fn with_tab_index(mut self, tab_index: i32) -> Self {
        self.tab_index = tab_index;
        self
    }

    /// Set the picking mode.
    #[must_use]
    pub fn with_picking_mode(mut self, picking_mode: PickingMode) -> Self {
        self.picking_mode = picking_mode;
        self
    }
}

// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The focus ring seam.

use trellis_event::{Event, EventKind, FocusChangeDirection, Key, Modifiers, NavigationDirection};
use trellis_tree::{ElementFlags, ElementId, ElementTree};

/// Strategy that turns input into focus movement.
pub trait FocusRing {
    /// How `event` asks focus to move away from `current`, or
    /// [`FocusChangeDirection::None`] if it does not.
    fn focus_change_direction(
        &self,
        tree: &ElementTree,
        current: Option<ElementId>,
        event: &Event,
    ) -> FocusChangeDirection;

    /// The element that should receive focus when moving from `current` in `direction`.
    ///
    /// [`FocusChangeDirection::None`] and [`FocusChangeDirection::Unspecified`]
    /// return `current` unchanged.
    fn next_focusable(
        &mut self,
        tree: &ElementTree,
        current: Option<ElementId>,
        direction: FocusChangeDirection,
    ) -> Option<ElementId>;
}

/// Sequential direction requested by a `Tab` key press or a `Next`/`Previous`
/// navigation event.
pub(crate) fn sequential_direction(event: &Event) -> FocusChangeDirection {
    match event.kind() {
        EventKind::KeyDown => match event.key() {
            Some(k) if k.key == Key::Tab => {
                if k.modifiers.contains(Modifiers::SHIFT) {
                    FocusChangeDirection::Previous
                } else {
                    FocusChangeDirection::Next
                }
            }
            _ => FocusChangeDirection::None,
        },
        EventKind::NavigationMove => match event.navigation().map(|n| n.direction) {
            Some(NavigationDirection::Next) => FocusChangeDirection::Next,
            Some(NavigationDirection::Previous) => FocusChangeDirection::Previous,
            _ => FocusChangeDirection::None,
        },
        _ => FocusChangeDirection::None,
    }
}

/// Whether `id` may be reached by keyboard navigation.
pub(crate) fn is_navigable(tree: &ElementTree, id: ElementId) -> bool {
    tree.can_grab_focus(id)
        && tree.tab_index(id).is_some_and(|t| t >= 0)
        && !tree.flags(id).is_some_and(|f| {
            f.intersects(ElementFlags::DELEGATES_FOCUS | ElementFlags::EXCLUDED_FROM_FOCUS_RING)
        })
}

/// Relative tolerance of [`approximately`].
pub const APPROXIMATELY_RELATIVE: f64 = 1e-6;

/// Absolute tolerance of [`approximately`]: eight times the smallest normal `f32`.
pub const APPROXIMATELY_ABSOLUTE: f64 = 1.175_494_35e-38 * 8.0;

/// Compare two coordinates with the tolerance rule of the navigation algorithm:
/// relative `1e-6`, with an absolute floor near the smallest normal `f32`.
///
/// The constants are kept for behavioral parity with existing layouts; they are
/// not derived from any precision analysis.
pub fn approximately(a: f64, b: f64) -> bool {
    (b - a).abs() < (APPROXIMATELY_RELATIVE * a.abs().max(b.abs())).max(APPROXIMATELY_ABSOLUTE)
}

/// Element that actually receives focus when `id` is focused.
///
/// Elements flagged [`ElementFlags::DELEGATES_FOCUS`] forward focus to their
/// first descendant (in tree order) that can take focus.
pub fn focus_delegate(tree: &ElementTree, id: ElementId) -> Option<ElementId> {
    let delegates = tree
        .flags(id)
        .is_some_and(|f| f.contains(ElementFlags::DELEGATES_FOCUS));
    if !delegates {
        return tree.can_grab_focus(id).then_some(id);
    }
    tree.descendants(id)
        .into_iter()
        .skip(1)
        .find(|&d| {
            tree.can_grab_focus(d)
                && !tree
                    .flags(d)
                    .is_some_and(|f| f.contains(ElementFlags::DELEGATES_FOCUS))
        })
}

/// First ancestor-or-self of `target` that can take focus; pointer downs focus it.
pub fn focusable_parent_for_pointer(tree: &ElementTree, target: ElementId) -> Option<ElementId> {
    tree.ancestors_or_self(target)
        .find(|&a| tree.can_grab_focus(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use trellis_tree::ElementProps;

    #[test]
    fn approximately_matches_relative_rule() {
        assert!(approximately(0.0, 0.0));
        assert!(approximately(1_000_000.0, 1_000_000.5));
        assert!(!approximately(1.0, 1.001));
        assert!(!approximately(0.0, 1e-30));
    }

    #[test]
    fn delegate_skips_to_first_focusable_descendant() {
        let mut t = ElementTree::new();
        let root = t.insert(None, ElementProps::at(Rect::ZERO));
        let host = t.insert(
            Some(root),
            ElementProps::focusable(Rect::ZERO).with_flags(ElementFlags::DELEGATES_FOCUS),
        );
        let plain = t.insert(Some(host), ElementProps::at(Rect::ZERO));
        let inner = t.insert(Some(plain), ElementProps::focusable(Rect::ZERO));
        assert_eq!(focus_delegate(&t, host), Some(inner));
        assert_eq!(focus_delegate(&t, inner), Some(inner));
        assert_eq!(focus_delegate(&t, plain), None);
        assert_eq!(focusable_parent_for_pointer(&t, plain), Some(host));
    }
}

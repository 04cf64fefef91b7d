// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Directional (arrow key / gamepad) focus ring.

use core::cmp::Ordering;

use kurbo::Rect;
use trellis_event::{Event, EventKind, FocusChangeDirection, NavigationDirection};
use trellis_tree::{ElementId, ElementTree};

use crate::ring::{FocusRing, approximately, is_navigable, sequential_direction};
use crate::tab::{DefaultFocusOrder, TabOrderFocusRing};

/// Focus ring for spatial navigation.
///
/// Directional moves pick, among navigable elements overlapping the current
/// element's rectangle stretched to the panel edge in the requested direction,
/// the one whose leading edge comes first; ties go to the element whose top-left
/// corner is closest to the current one's. When nothing lies beyond the current
/// element, the search is repeated towards the opposite edge, which wraps
/// around. Sequential moves are delegated to a [`TabOrderFocusRing`].
#[derive(Clone, Debug, Default)]
pub struct NavigateFocusRing {
    sequential: TabOrderFocusRing,
}

impl NavigateFocusRing {
    /// Create a ring; `default_order` applies to sequential moves.
    pub fn new(default_order: DefaultFocusOrder) -> Self {
        Self {
            sequential: TabOrderFocusRing::new(default_order),
        }
    }

    fn next_focusable_2d(
        &self,
        tree: &ElementTree,
        current: Option<ElementId>,
        direction: FocusChangeDirection,
    ) -> Option<ElementId> {
        let root = tree.root()?;
        let origin = current.filter(|&c| tree.is_alive(c)).unwrap_or(root);
        let panel = bounding_box(tree, root).inflate(1.0, 1.0);
        let rect = tree.layout(origin).unwrap_or(Rect::ZERO);

        let mut valid = rect.inflate(1.0, 1.0);
        match direction {
            FocusChangeDirection::Up => valid.y0 = panel.y0,
            FocusChangeDirection::Down => valid.y1 = panel.y1,
            FocusChangeDirection::Left => valid.x0 = panel.x0,
            FocusChangeDirection::Right => valid.x1 = panel.x1,
            _ => return current,
        }
        let first = Traversal {
            tree,
            current: rect,
            direction,
            valid,
            first_pass: true,
        };
        if let Some(best) = first.best_overall(root, None) {
            return Some(best);
        }

        let mut valid = rect.inflate(1.0, 1.0);
        match direction {
            FocusChangeDirection::Down => valid.y0 = panel.y0,
            FocusChangeDirection::Up => valid.y1 = panel.y1,
            FocusChangeDirection::Right => valid.x0 = panel.x0,
            FocusChangeDirection::Left => valid.x1 = panel.x1,
            _ => {}
        }
        let second = Traversal {
            valid,
            first_pass: false,
            ..first
        };
        second.best_overall(root, None).or(current)
    }
}

/// Union of the layout of `id` and every visible descendant.
fn bounding_box(tree: &ElementTree, id: ElementId) -> Rect {
    let mut bounds = tree.layout(id).unwrap_or(Rect::ZERO);
    for &child in tree.children_of(id) {
        if tree.is_visible_in_hierarchy(child) {
            bounds = bounds.union(bounding_box(tree, child));
        }
    }
    bounds
}

/// Strict rectangle overlap: touching edges do not overlap.
fn overlaps(a: Rect, b: Rect) -> bool {
    a.x1 > b.x0 && a.x0 < b.x1 && a.y1 > b.y0 && a.y0 < b.y1
}

fn sign(diff: f64) -> Ordering {
    if approximately(diff, 0.0) {
        Ordering::Equal
    } else if diff > 0.0 {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

#[derive(Clone, Copy)]
struct Traversal<'a> {
    tree: &'a ElementTree,
    current: Rect,
    direction: FocusChangeDirection,
    valid: Rect,
    first_pass: bool,
}

impl Traversal<'_> {
    fn validate_hierarchy(&self, id: ElementId) -> bool {
        self.tree.is_visible_in_hierarchy(id)
            && self.tree.is_enabled_in_hierarchy(id)
            && overlaps(bounding_box(self.tree, id), self.valid)
    }

    fn validate_element(&self, id: ElementId) -> bool {
        is_navigable(self.tree, id)
            && self
                .tree
                .layout(id)
                .is_some_and(|r| overlaps(r, self.valid))
    }

    /// `Greater` when `a` comes after `b` in the requested direction.
    fn strict_order(&self, a: Rect, b: Rect) -> Ordering {
        let diff = match self.direction {
            FocusChangeDirection::Up => b.y1 - a.y1,
            FocusChangeDirection::Down => a.y0 - b.y0,
            FocusChangeDirection::Left => b.x1 - a.x1,
            FocusChangeDirection::Right => a.x0 - b.x0,
            _ => 0.0,
        };
        sign(diff)
    }

    fn tie_breaker(&self, a: Rect, b: Rect) -> Ordering {
        let c = self.current.origin();
        let da = (a.origin() - c).hypot2();
        let db = (b.origin() - c).hypot2();
        sign(da - db)
    }

    fn order(&self, a: Rect, b: Rect) -> Ordering {
        self.strict_order(a, b).then_with(|| self.tie_breaker(a, b))
    }

    fn best_overall(&self, candidate: ElementId, best: Option<ElementId>) -> Option<ElementId> {
        if !self.validate_hierarchy(candidate) {
            return best;
        }
        if self.validate_element(candidate) {
            let rect = self.tree.layout(candidate).unwrap_or(Rect::ZERO);
            let beyond = !self.first_pass || self.strict_order(rect, self.current) == Ordering::Greater;
            let better = best.is_none_or(|b| {
                let rb = self.tree.layout(b).unwrap_or(Rect::ZERO);
                self.order(rb, rect) == Ordering::Greater
            });
            return if beyond && better { Some(candidate) } else { best };
        }
        self.tree
            .children_of(candidate)
            .iter()
            .fold(best, |best, &child| self.best_overall(child, best))
    }
}

impl FocusRing for NavigateFocusRing {
    fn focus_change_direction(
        &self,
        _tree: &ElementTree,
        _current: Option<ElementId>,
        event: &Event,
    ) -> FocusChangeDirection {
        if event.kind() != EventKind::NavigationMove {
            return sequential_direction(event);
        }
        match event.navigation().map(|n| n.direction) {
            Some(NavigationDirection::Left) => FocusChangeDirection::Left,
            Some(NavigationDirection::Right) => FocusChangeDirection::Right,
            Some(NavigationDirection::Up) => FocusChangeDirection::Up,
            Some(NavigationDirection::Down) => FocusChangeDirection::Down,
            Some(NavigationDirection::Next) => FocusChangeDirection::Next,
            Some(NavigationDirection::Previous) => FocusChangeDirection::Previous,
            _ => FocusChangeDirection::None,
        }
    }

    fn next_focusable(
        &mut self,
        tree: &ElementTree,
        current: Option<ElementId>,
        direction: FocusChangeDirection,
    ) -> Option<ElementId> {
        if direction.is_directional() {
            self.next_focusable_2d(tree, current, direction)
        } else {
            self.sequential.next_focusable(tree, current, direction)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_tree::ElementProps;

    /// 3x3 grid of 10x10 focusable cells with a 10px gap.
    fn grid() -> (ElementTree, Vec<ElementId>) {
        let mut t = ElementTree::new();
        let root = t.insert(None, ElementProps::at(Rect::new(0.0, 0.0, 50.0, 50.0)));
        let mut cells = Vec::new();
        for row in 0_u8..3 {
            for col in 0_u8..3 {
                let x = f64::from(col) * 20.0;
                let y = f64::from(row) * 20.0;
                cells.push(t.insert(
                    Some(root),
                    ElementProps::focusable(Rect::new(x, y, x + 10.0, y + 10.0)),
                ));
            }
        }
        (t, cells)
    }

    #[test]
    fn moves_to_nearest_in_direction() {
        let (t, c) = grid();
        let mut ring = NavigateFocusRing::default();
        assert_eq!(ring.next_focusable(&t, Some(c[4]), FocusChangeDirection::Right), Some(c[5]));
        assert_eq!(ring.next_focusable(&t, Some(c[4]), FocusChangeDirection::Left), Some(c[3]));
        assert_eq!(ring.next_focusable(&t, Some(c[4]), FocusChangeDirection::Up), Some(c[1]));
        assert_eq!(ring.next_focusable(&t, Some(c[4]), FocusChangeDirection::Down), Some(c[7]));
    }

    #[test]
    fn wraps_to_opposite_edge() {
        let (t, c) = grid();
        let mut ring = NavigateFocusRing::default();
        assert_eq!(ring.next_focusable(&t, Some(c[5]), FocusChangeDirection::Right), Some(c[3]));
        assert_eq!(ring.next_focusable(&t, Some(c[1]), FocusChangeDirection::Up), Some(c[7]));
    }

    #[test]
    fn lone_element_stays_focused() {
        let mut t = ElementTree::new();
        let root = t.insert(None, ElementProps::at(Rect::new(0.0, 0.0, 50.0, 50.0)));
        let only = t.insert(Some(root), ElementProps::focusable(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let mut ring = NavigateFocusRing::default();
        assert_eq!(ring.next_focusable(&t, Some(only), FocusChangeDirection::Down), Some(only));
    }

    #[test]
    fn sequential_moves_use_tab_order() {
        let (t, c) = grid();
        let mut ring = NavigateFocusRing::default();
        assert_eq!(ring.next_focusable(&t, Some(c[2]), FocusChangeDirection::Next), Some(c[3]));
    }
}

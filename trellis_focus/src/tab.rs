// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sequential (tab order) focus ring.

use core::cmp::Ordering;

use trellis_event::{Event, FocusChangeDirection};
use trellis_tree::{ElementFlags, ElementId, ElementTree};

use crate::ring::{FocusRing, sequential_direction};

/// Order of elements that share a tab index.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DefaultFocusOrder {
    /// Discovery (tree) order.
    #[default]
    ChildOrder,
    /// Left to right, then top to bottom, then discovery order.
    PositionXY,
    /// Top to bottom, then left to right, then discovery order.
    PositionYX,
}

#[derive(Clone, Debug)]
struct Record {
    element: ElementId,
    auto_index: usize,
    tab_index: i32,
    is_slot: bool,
    /// Children of a nested scope (composite root or content container).
    scope: Option<Vec<Record>>,
}

/// Focus ring following tab indices, rebuilt from the tree on every query.
///
/// Composite roots and content containers form nested scopes: their descendants
/// are sorted among themselves and inlined right after the scope element. Within
/// a scope, positive tab indices come first in ascending order and tab index `0`
/// comes last; ties follow [`DefaultFocusOrder`]. Elements with a negative tab
/// index, elements that cannot take focus, and everything inside a scope that
/// cannot take focus are left out (content containers are still traversed).
#[derive(Clone, Debug, Default)]
pub struct TabOrderFocusRing {
    default_order: DefaultFocusOrder,
    ring: Vec<ElementId>,
}

impl TabOrderFocusRing {
    /// Create a ring with the given tie-break order.
    pub fn new(default_order: DefaultFocusOrder) -> Self {
        Self {
            default_order,
            ring: Vec::new(),
        }
    }

    /// The tie-break order.
    pub fn default_order(&self) -> DefaultFocusOrder {
        self.default_order
    }

    /// Change the tie-break order.
    pub fn set_default_order(&mut self, order: DefaultFocusOrder) {
        self.default_order = order;
    }

    /// Rebuild and return the ring.
    pub fn ring(&mut self, tree: &ElementTree) -> &[ElementId] {
        self.update(tree);
        &self.ring
    }

    fn update(&mut self, tree: &ElementTree) {
        self.ring.clear();
        let Some(root) = tree.root() else {
            return;
        };
        let mut sequence = Vec::new();
        let mut auto_index = 0;
        build_scope(tree, root, &mut auto_index, &mut sequence);
        let mut ring = core::mem::take(&mut self.ring);
        self.flatten(tree, sequence, &mut ring);
        self.ring = ring;
    }

    fn flatten(&self, tree: &ElementTree, mut scope: Vec<Record>, out: &mut Vec<ElementId>) {
        scope.sort_by(|a, b| self.sort(tree, a, b));
        for record in scope {
            if tree.can_grab_focus(record.element) && record.tab_index >= 0 {
                let excluded = tree
                    .flags(record.element)
                    .is_some_and(|f| f.contains(ElementFlags::EXCLUDED_FROM_FOCUS_RING));
                if !excluded {
                    out.push(record.element);
                }
                if let Some(children) = record.scope {
                    self.flatten(tree, children, out);
                }
            } else if record.is_slot {
                if let Some(children) = record.scope {
                    self.flatten(tree, children, out);
                }
            }
        }
    }

    fn sort(&self, tree: &ElementTree, a: &Record, b: &Record) -> Ordering {
        match (a.tab_index, b.tab_index) {
            (0, 0) => self.auto_index_sort(tree, a, b),
            (0, _) => Ordering::Greater,
            (_, 0) => Ordering::Less,
            (x, y) => x.cmp(&y).then_with(|| self.auto_index_sort(tree, a, b)),
        }
    }

    fn auto_index_sort(&self, tree: &ElementTree, a: &Record, b: &Record) -> Ordering {
        let by_position = |first_x: bool| {
            let (Some(ra), Some(rb)) = (tree.layout(a.element), tree.layout(b.element)) else {
                return Ordering::Equal;
            };
            let x = ra.x0.total_cmp(&rb.x0);
            let y = ra.y0.total_cmp(&rb.y0);
            if first_x { x.then(y) } else { y.then(x) }
        };
        let position = match self.default_order {
            DefaultFocusOrder::ChildOrder => Ordering::Equal,
            DefaultFocusOrder::PositionXY => by_position(true),
            DefaultFocusOrder::PositionYX => by_position(false),
        };
        position.then(a.auto_index.cmp(&b.auto_index))
    }

    /// Next ring element after `current` in tree order, for elements outside the ring.
    fn next_in_tree_order(&self, tree: &ElementTree, current: ElementId, forward: bool) -> Option<ElementId> {
        let root = tree.root()?;
        let order = tree.descendants(root);
        let pos = order.iter().position(|&e| e == current)?;
        let n = order.len();
        (1..n)
            .map(|step| {
                if forward {
                    order[(pos + step) % n]
                } else {
                    order[(pos + n - step) % n]
                }
            })
            .find(|e| self.ring.contains(e))
    }
}

fn build_scope(tree: &ElementTree, element: ElementId, auto_index: &mut usize, scope: &mut Vec<Record>) {
    for &child in tree.children_of(element) {
        let flags = tree.flags(child).unwrap_or_default();
        let is_slot = flags.contains(ElementFlags::CONTENT_CONTAINER);
        let record = Record {
            element: child,
            auto_index: *auto_index,
            tab_index: tree.tab_index(child).unwrap_or(-1),
            is_slot,
            scope: None,
        };
        *auto_index += 1;
        if flags.contains(ElementFlags::COMPOSITE_ROOT) || is_slot {
            let mut nested = Vec::new();
            let mut nested_index = 0;
            build_scope(tree, child, &mut nested_index, &mut nested);
            scope.push(Record {
                scope: Some(nested),
                ..record
            });
        } else {
            scope.push(record);
            build_scope(tree, child, auto_index, scope);
        }
    }
}

impl FocusRing for TabOrderFocusRing {
    fn focus_change_direction(
        &self,
        _tree: &ElementTree,
        _current: Option<ElementId>,
        event: &Event,
    ) -> FocusChangeDirection {
        sequential_direction(event)
    }

    fn next_focusable(
        &mut self,
        tree: &ElementTree,
        current: Option<ElementId>,
        direction: FocusChangeDirection,
    ) -> Option<ElementId> {
        let forward = match direction {
            FocusChangeDirection::Next => true,
            FocusChangeDirection::Previous => false,
            _ => return current,
        };
        self.update(tree);
        if self.ring.is_empty() {
            return None;
        }
        let delegates = |e: ElementId| {
            tree.flags(e)
                .is_some_and(|f| f.contains(ElementFlags::DELEGATES_FOCUS))
        };
        let position = current.and_then(|c| self.ring.iter().position(|&e| e == c));
        if let (Some(c), None) = (current, position) {
            return self
                .next_in_tree_order(tree, c, forward)
                .or_else(|| (if forward { self.ring.first() } else { self.ring.last() }).copied());
        }
        let n = self.ring.len();
        if forward {
            let mut index = position.map_or(0, |p| (p + 1) % n);
            while delegates(self.ring[index]) {
                index += 1;
                if index == n {
                    return None;
                }
            }
            Some(self.ring[index])
        } else {
            let mut index = position.map_or(n - 1, |p| (p + n - 1) % n);
            while delegates(self.ring[index]) {
                if index == 0 {
                    return None;
                }
                index -= 1;
            }
            Some(self.ring[index])
        }
    }
}

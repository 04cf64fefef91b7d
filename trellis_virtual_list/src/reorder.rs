// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A drag-and-drop controller that reorders a shared `Vec`.

use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use crate::drag::{DragAndDropController, DragArgs, DragVisualMode, DropPosition, StartDragArgs};

/// Move the items at `indices` so they sit before `insert_at`, keeping their
/// relative order.
///
/// `insert_at` is an index into `items` before the move, so
/// `insert_at == items.len()` appends. Out-of-range and repeated indices are
/// ignored. Returns the new indices of the moved items, ascending.
pub fn reorder_items<T>(items: &mut Vec<T>, indices: &[usize], insert_at: usize) -> Vec<usize> {
    let len = items.len();
    let mut moving: Vec<usize> = indices.iter().copied().filter(|&i| i < len).collect();
    moving.sort_unstable();
    moving.dedup();
    if moving.is_empty() {
        return moving;
    }
    let insert_at = insert_at.min(len);
    let before = moving.iter().filter(|&&i| i < insert_at).count();

    // Pull the moving items out back to front so earlier indices stay valid.
    let mut taken: Vec<T> = moving.iter().rev().map(|&i| items.remove(i)).collect();
    taken.reverse();

    let at = insert_at - before;
    let placed = taken.len();
    items.splice(at..at, taken);
    (at..at + placed).collect()
}

/// Reorders items of a list by dragging, within the list itself.
///
/// Drops between rows and outside them move the dragged items; drops onto a
/// row are rejected. The items live behind an `Rc<RefCell<_>>` shared with the
/// list's binder.
pub struct ReorderableDragAndDropController<T> {
    items: Rc<RefCell<Vec<T>>>,
    enabled: bool,
    title_of: Option<Box<dyn Fn(&T) -> String>>,
    selection: Vec<usize>,
}

impl<T> fmt::Debug for ReorderableDragAndDropController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReorderableDragAndDropController")
            .field("items", &self.items.borrow().len())
            .field("enabled", &self.enabled)
            .field("title_of", &self.title_of.is_some())
            .field("selection", &self.selection)
            .finish()
    }
}

impl<T> ReorderableDragAndDropController<T> {
    /// Reorder `items` when drops are accepted.
    pub fn new(items: Rc<RefCell<Vec<T>>>) -> Self {
        Self {
            items,
            enabled: true,
            title_of: None,
            selection: Vec::new(),
        }
    }

    /// Label single-item drags with `title_of`. Other drags show a count.
    pub fn with_title(mut self, title_of: impl Fn(&T) -> String + 'static) -> Self {
        self.title_of = Some(Box::new(title_of));
        self
    }

    /// The shared items.
    pub fn items(&self) -> &Rc<RefCell<Vec<T>>> {
        &self.items
    }

    /// Whether dragging is allowed.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Allow or forbid dragging.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Where the dropped items ended up, for the host to select them.
    pub fn selection(&self) -> &[usize] {
        &self.selection
    }
}

impl<T> DragAndDropController for ReorderableDragAndDropController<T> {
    fn can_start_drag(&self, indices: &[usize]) -> bool {
        let len = self.items.borrow().len();
        self.enabled && !indices.is_empty() && indices.iter().all(|&i| i < len)
    }

    fn setup_drag_and_drop(&mut self, indices: &[usize]) -> StartDragArgs {
        let items = self.items.borrow();
        let title = match (indices, &self.title_of) {
            ([index], Some(title_of)) => items.get(*index).map(title_of).unwrap_or_default(),
            _ => format!("{} items", indices.len()),
        };
        StartDragArgs { title }
    }

    fn handle_drag_and_drop(&mut self, args: &DragArgs) -> DragVisualMode {
        if !self.enabled {
            return DragVisualMode::Rejected;
        }
        match args.target.drop_position {
            DropPosition::OverItem => DragVisualMode::Rejected,
            DropPosition::BetweenItems | DropPosition::OutsideItems => DragVisualMode::Move,
        }
    }

    fn on_drop(&mut self, args: &DragArgs) {
        let mut items = self.items.borrow_mut();
        self.selection = reorder_items(&mut items, &args.indices, args.target.insert_at_index);
        tracing::debug!(selection = ?self.selection, "items reordered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::DragPosition;
    use kurbo::Point;

    fn drop_at(insert_at_index: usize, drop_position: DropPosition, indices: &[usize]) -> DragArgs {
        DragArgs {
            position: Point::ZERO,
            target: DragPosition {
                insert_at_index,
                hovered_index: None,
                drop_position,
            },
            indices: indices.to_vec(),
        }
    }

    #[test]
    fn reorder_moves_down_and_up() {
        let mut items = vec!['a', 'b', 'c', 'd', 'e'];
        assert_eq!(reorder_items(&mut items, &[1], 4), [3]);
        assert_eq!(items, ['a', 'c', 'd', 'b', 'e']);

        assert_eq!(reorder_items(&mut items, &[3], 0), [0]);
        assert_eq!(items, ['b', 'a', 'c', 'd', 'e']);

        assert_eq!(reorder_items(&mut items, &[0], 5), [4]);
        assert_eq!(items, ['a', 'c', 'd', 'e', 'b']);
    }

    #[test]
    fn reorder_keeps_the_order_of_a_scattered_selection() {
        let mut items = vec![0, 1, 2, 3, 4, 5];
        assert_eq!(reorder_items(&mut items, &[4, 1, 4, 9], 3), [2, 3]);
        assert_eq!(items, [0, 2, 1, 4, 3, 5]);

        // Dropping onto its own place changes nothing.
        assert_eq!(reorder_items(&mut items, &[2], 2), [2]);
        assert_eq!(reorder_items(&mut items, &[2], 3), [2]);
        assert_eq!(items, [0, 2, 1, 4, 3, 5]);
        assert!(reorder_items(&mut items, &[], 3).is_empty());
    }

    #[test]
    fn controller_moves_between_items_only() {
        let items = Rc::new(RefCell::new(vec!["x", "y", "z"]));
        let mut controller =
            ReorderableDragAndDropController::new(items.clone()).with_title(|s| s.to_uppercase());

        assert!(controller.can_start_drag(&[2]));
        assert!(!controller.can_start_drag(&[3]));
        assert_eq!(controller.setup_drag_and_drop(&[2]).title, "Z");
        assert_eq!(controller.setup_drag_and_drop(&[0, 2]).title, "2 items");

        let over = drop_at(1, DropPosition::OverItem, &[2]);
        assert_eq!(controller.handle_drag_and_drop(&over), DragVisualMode::Rejected);
        let between = drop_at(0, DropPosition::BetweenItems, &[2]);
        assert_eq!(controller.handle_drag_and_drop(&between), DragVisualMode::Move);

        controller.on_drop(&between);
        assert_eq!(*items.borrow(), ["z", "x", "y"]);
        assert_eq!(controller.selection(), [0]);

        controller.set_enabled(false);
        assert!(!controller.can_start_drag(&[0]));
        assert_eq!(controller.handle_drag_and_drop(&between), DragVisualMode::Rejected);
    }
}

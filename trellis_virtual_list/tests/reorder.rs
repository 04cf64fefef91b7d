// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A list backed by shared data, scrolled and reordered by dragging.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::Point;
use trellis_virtual_list::{
    CollectionBinder, CollectionVirtualizationController, DragVisualMode,
    DynamicHeightVirtualizationController, FixedHeightVirtualizationController, ListViewDragger,
    ListViewDraggerAnimated, ReorderableDragAndDropController, ScrollTarget,
};

/// Rows copy the label of the item they show.
struct Labels {
    items: Rc<RefCell<Vec<String>>>,
    binds: usize,
}

impl Labels {
    fn new(count: usize) -> (Self, Rc<RefCell<Vec<String>>>) {
        let items = Rc::new(RefCell::new((0..count).map(|i| format!("#{i}")).collect()));
        (
            Self {
                items: items.clone(),
                binds: 0,
            },
            items,
        )
    }
}

impl CollectionBinder for Labels {
    type Item = String;

    fn item_count(&self) -> usize {
        self.items.borrow().len()
    }

    fn make_item(&mut self) -> String {
        String::new()
    }

    fn bind_item(&mut self, row: &mut String, index: usize) {
        self.binds += 1;
        row.clone_from(&self.items.borrow()[index]);
    }

    fn unbind_item(&mut self, row: &mut String, _index: usize) {
        row.clear();
    }

    fn destroy_item(&mut self, _row: String) {}
}

fn labels<L: CollectionVirtualizationController<Binder = Labels>>(list: &L) -> Vec<&str> {
    list.active_items()
        .iter()
        .filter(|r| r.index().is_some())
        .map(|r| r.item().as_str())
        .collect()
}

#[test]
fn thousand_rows_scrolled_to_505() {
    let (binder, _) = Labels::new(1000);
    let mut list = FixedHeightVirtualizationController::new(binder, 20.0);
    list.resize(200.0);
    list.on_scroll(505.0);

    assert_eq!(list.first_visible_index(), 25);
    let bound: Vec<_> = list.active_items().iter().map(|r| r.index()).collect();
    assert_eq!(bound, (25..=36).map(Some).collect::<Vec<_>>());
    assert_eq!(list.active_items()[0].top(), 500.0);
    assert_eq!(list.index_from_position(505.0), 25);

    let binds = list.binder().binds;
    list.scroll_to_item(ScrollTarget::Index(36));
    // 36 ends at 740, so the view moves to 540 and two rows rotate around.
    assert_eq!(list.scroll_offset(), 540.0);
    assert_eq!(list.binder().binds, binds + 2);
}

#[test]
fn dragging_a_row_reorders_the_data() {
    let (binder, items) = Labels::new(10);
    let mut list = FixedHeightVirtualizationController::new(binder, 20.0);
    list.resize(100.0);
    let mut dragger = ListViewDragger::new(ReorderableDragAndDropController::new(items.clone()));

    // Grab "#1" and drop it in the band above "#4".
    assert!(dragger.on_pointer_down(&list, Point::new(5.0, 30.0), &[]));
    assert_eq!(
        dragger.on_pointer_move(&mut list, Point::new(5.0, 81.0)),
        Some(DragVisualMode::Move)
    );
    assert_eq!(
        dragger.on_pointer_up(&mut list, Point::new(5.0, 81.0)),
        Some(DragVisualMode::Move)
    );

    assert_eq!(items.borrow()[..5], ["#0", "#2", "#3", "#1", "#4"]);
    assert_eq!(dragger.controller().selection(), [3]);
    // The drop refreshed the rows.
    assert_eq!(labels(&list)[..5], ["#0", "#2", "#3", "#1", "#4"]);
}

#[test]
fn animated_drag_reorders_measured_rows() {
    let (binder, items) = Labels::new(10);
    let mut list = DynamicHeightVirtualizationController::new(binder, 20.0);
    list.resize(100.0);
    for index in 0..10 {
        list.on_item_geometry_changed(index, 20.0);
    }
    list.fill();
    let mut dragger =
        ListViewDraggerAnimated::new(ReorderableDragAndDropController::new(items.clone()));

    // Grab "#0"; with it out of the flow, 41 is in the top band of "#3".
    assert!(dragger.on_pointer_down(&list, Point::new(5.0, 10.0)));
    dragger.on_pointer_move(&mut list, Point::new(5.0, 41.0));
    assert_eq!(list.dragged_index(), Some(0));
    assert_eq!(dragger.parted_index(), Some(3));
    dragger.update(500);
    assert_eq!(dragger.padding_top(3), 20.0);

    assert_eq!(
        dragger.on_pointer_up(&mut list, Point::new(5.0, 41.0)),
        Some(DragVisualMode::Move)
    );
    assert_eq!(items.borrow()[..4], ["#1", "#2", "#0", "#3"]);
    assert_eq!(list.dragged_index(), None);
    assert_eq!(labels(&list)[..4], ["#1", "#2", "#0", "#3"]);
}

// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Virtualization for rows of one constant height.

use core::fmt;

use crate::controller::{
    CollectionBinder, CollectionVirtualizationController, ItemOf, RecycledItem, ScrollTarget,
    grid_count, grid_index, is_ready, park_item, rebind_item, release_item, reveal_offset,
    rotate_window, setup_item,
};

/// Rows beyond the viewport kept bound so short scrolls do not rebind.
const OVERSCAN_ROWS: usize = 2;

/// Recycles rows of a list whose items all have the same height.
///
/// Every index/offset mapping is O(1): item `i` starts at `i * item_height`.
/// The pool holds `min(ceil(viewport / item_height) + 2, item_count)` rows.
pub struct FixedHeightVirtualizationController<B: CollectionBinder> {
    binder: B,
    item_height: f64,
    viewport_height: f64,
    scroll_offset: f64,
    first_visible_index: usize,
    rows: Vec<RecycledItem<B::Item>>,
}

impl<B: CollectionBinder> fmt::Debug for FixedHeightVirtualizationController<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedHeightVirtualizationController")
            .field("item_height", &self.item_height)
            .field("viewport_height", &self.viewport_height)
            .field("scroll_offset", &self.scroll_offset)
            .field("first_visible_index", &self.first_visible_index)
            .field("rows", &self.rows.len())
            .finish_non_exhaustive()
    }
}

impl<B: CollectionBinder> FixedHeightVirtualizationController<B> {
    /// Create a controller with no rows. Call [`resize`] once the viewport is known.
    ///
    /// # Panics
    ///
    /// If `item_height` is not finite and positive.
    ///
    /// [`resize`]: CollectionVirtualizationController::resize
    pub fn new(binder: B, item_height: f64) -> Self {
        assert!(
            is_ready(item_height),
            "item height must be finite and positive, got {item_height}"
        );
        Self {
            binder,
            item_height,
            viewport_height: 0.0,
            scroll_offset: 0.0,
            first_visible_index: 0,
            rows: Vec::new(),
        }
    }

    /// The shared row height.
    pub fn fixed_item_height(&self) -> f64 {
        self.item_height
    }

    /// Change the shared row height. Unusable heights are ignored.
    pub fn set_item_height(&mut self, item_height: f64) {
        if !is_ready(item_height) || item_height == self.item_height {
            return;
        }
        self.item_height = item_height;
        self.resize_pool();
        self.layout();
    }

    /// Unbind and destroy every row.
    pub fn clear(&mut self) {
        for row in self.rows.drain(..) {
            release_item(&mut self.binder, row);
        }
    }

    fn wanted_rows(&self) -> usize {
        if !is_ready(self.viewport_height) {
            return 0;
        }
        let visible = grid_count(self.viewport_height, self.item_height) + OVERSCAN_ROWS;
        visible.min(self.binder.item_count())
    }

    fn resize_pool(&mut self) {
        let wanted = self.wanted_rows();
        let current = self.rows.len();
        if wanted > current {
            for _ in current..wanted {
                let item = self.binder.make_item();
                self.rows.push(RecycledItem::new(item));
            }
        } else if wanted < current {
            for row in self.rows.drain(wanted..) {
                release_item(&mut self.binder, row);
            }
        } else {
            return;
        }
        tracing::debug!(from = current, to = wanted, "fixed-height row pool resized");
    }

    /// Clamp the offset, rotate the pool onto the new window and bind what changed.
    fn layout(&mut self) {
        let max = self.max_scroll_offset();
        self.scroll_offset = self.scroll_offset.clamp(0.0, max);
        let first = grid_index(self.scroll_offset, self.item_height);
        self.first_visible_index = first;

        rotate_window(&mut self.rows, first);
        let count = self.binder.item_count();
        let height = self.item_height;
        for (slot, row) in self.rows.iter_mut().enumerate() {
            let index = first + slot;
            setup_item(&mut self.binder, row, index, count);
            row.top = index as f64 * height;
            row.height = height;
        }
    }
}

impl<B: CollectionBinder> CollectionVirtualizationController for FixedHeightVirtualizationController<B> {
    type Binder = B;

    fn binder(&self) -> &B {
        &self.binder
    }

    fn binder_mut(&mut self) -> &mut B {
        &mut self.binder
    }

    fn active_items(&self) -> &[RecycledItem<ItemOf<B>>] {
        &self.rows
    }

    fn first_visible_index(&self) -> usize {
        self.first_visible_index
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    fn content_height(&self) -> f64 {
        self.binder.item_count() as f64 * self.item_height
    }

    fn item_height(&self, _index: usize) -> f64 {
        self.item_height
    }

    fn offset_of(&self, index: usize) -> f64 {
        index as f64 * self.item_height
    }

    fn index_from_position(&self, y: f64) -> usize {
        grid_index(y, self.item_height)
    }

    fn resize(&mut self, viewport_height: f64) {
        if !is_ready(viewport_height) {
            return;
        }
        self.viewport_height = viewport_height;
        self.resize_pool();
        self.layout();
    }

    fn on_scroll(&mut self, offset: f64) {
        if offset.is_nan() {
            return;
        }
        self.scroll_offset = offset;
        self.layout();
    }

    fn scroll_to_item(&mut self, target: ScrollTarget) {
        let count = self.binder.item_count();
        let index = match target {
            ScrollTarget::Last => {
                let max = self.max_scroll_offset();
                self.on_scroll(max);
                return;
            }
            ScrollTarget::Index(index) if index < count => index,
            ScrollTarget::Index(_) => return,
        };
        let offset = reveal_offset(
            self.scroll_offset,
            self.viewport_height,
            self.offset_of(index),
            self.item_height,
        );
        self.on_scroll(offset);
    }

    fn refresh(&mut self, rebuild: bool) {
        if rebuild {
            self.clear();
        } else {
            for row in &mut self.rows {
                park_item(&mut self.binder, row);
            }
        }
        self.resize_pool();
        self.layout();
    }

    fn replace_active_item(&mut self, index: usize) -> bool {
        let Some(row) = self.rows.iter_mut().find(|r| r.index == Some(index)) else {
            return false;
        };
        rebind_item(&mut self.binder, row);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::test_support::CountingBinder;

    fn list(count: usize, viewport: f64) -> FixedHeightVirtualizationController<CountingBinder> {
        let mut list = FixedHeightVirtualizationController::new(CountingBinder::new(count), 20.0);
        list.resize(viewport);
        list
    }

    fn bound(list: &FixedHeightVirtualizationController<CountingBinder>) -> Vec<Option<usize>> {
        list.active_items().iter().map(|r| r.index()).collect()
    }

    #[test]
    fn resize_keeps_viewport_plus_overscan_rows() {
        let mut list = list(1000, 200.0);
        assert_eq!(list.active_items().len(), 12);
        list.resize(210.0);
        assert_eq!(list.active_items().len(), 13);
        list.resize(100.0);
        assert_eq!(list.active_items().len(), 7);
        assert_eq!(list.binder().destroyed, 6);

        // Not ready yet.
        list.resize(f64::NAN);
        list.resize(0.0);
        assert_eq!(list.viewport_height(), 100.0);

        let short = self::list(5, 200.0);
        assert_eq!(short.active_items().len(), 5);
    }

    #[test]
    fn index_and_offset_are_linear() {
        let list = list(1000, 200.0);
        assert_eq!(list.index_from_position(0.0), 0);
        assert_eq!(list.index_from_position(19.9), 0);
        assert_eq!(list.index_from_position(20.0), 1);
        assert_eq!(list.index_from_position(505.0), 25);
        assert_eq!(list.offset_of(25), 500.0);
        assert_eq!(list.content_height(), 20_000.0);
        assert_eq!(list.max_scroll_offset(), 19_800.0);
    }

    #[test]
    fn scrolling_rebinds_only_rows_that_change_index() {
        let mut list = list(1000, 200.0);
        assert_eq!(list.binder().binds, 12);
        list.binder_mut().reset_counts();

        list.on_scroll(40.0);
        assert_eq!(list.first_visible_index(), 2);
        assert_eq!((list.binder().binds, list.binder().unbinds), (2, 2));
        assert_eq!(bound(&list), (2..14).map(Some).collect::<Vec<_>>());

        // Sub-row scrolling moves nothing.
        list.binder_mut().reset_counts();
        list.on_scroll(45.0);
        assert_eq!(list.binder().binds, 0);

        // Back up one row: the tail row moves to the head.
        list.on_scroll(20.0);
        assert_eq!(list.binder().binds, 1);
        assert_eq!(list.active_items()[0].index(), Some(1));
        assert_eq!(list.active_items()[0].top(), 20.0);
    }

    #[test]
    fn scroll_is_clamped_and_rows_past_the_end_are_parked() {
        let mut list = list(1000, 200.0);
        list.on_scroll(1e9);
        assert_eq!(list.scroll_offset(), 19_800.0);
        assert_eq!(list.first_visible_index(), 990);
        let indices = bound(&list);
        assert_eq!(indices[9], Some(999));
        assert_eq!(&indices[10..], [None, None]);

        list.on_scroll(-50.0);
        assert_eq!(list.scroll_offset(), 0.0);
        assert_eq!(list.first_visible_index(), 0);
    }

    #[test]
    fn scroll_to_item_moves_the_least() {
        let mut list = list(1000, 200.0);
        list.scroll_to_item(ScrollTarget::Index(50));
        assert_eq!(list.scroll_offset(), 820.0);
        list.scroll_to_item(ScrollTarget::Index(45));
        assert_eq!(list.scroll_offset(), 820.0);
        list.scroll_to_item(ScrollTarget::Index(10));
        assert_eq!(list.scroll_offset(), 200.0);
        list.scroll_to_item(ScrollTarget::Index(5000));
        assert_eq!(list.scroll_offset(), 200.0);
        list.scroll_to_item(ScrollTarget::Last);
        assert_eq!(list.scroll_offset(), 19_800.0);
    }

    #[test]
    fn refresh_follows_the_collection() {
        let mut list = list(1000, 200.0);
        list.on_scroll(100.0);
        list.binder_mut().count = 3;
        list.refresh(false);
        assert_eq!(list.scroll_offset(), 0.0);
        assert_eq!(bound(&list), [Some(0), Some(1), Some(2)]);
        assert_eq!(list.binder().destroyed, 9);

        let made = list.binder().made;
        list.refresh(true);
        assert_eq!(list.binder().destroyed, 12);
        assert_eq!(list.binder().made, made + 3);

        list.binder_mut().reset_counts();
        assert!(list.replace_active_item(1));
        assert!(!list.replace_active_item(7));
        assert_eq!((list.binder().binds, list.binder().unbinds), (1, 1));
    }
}

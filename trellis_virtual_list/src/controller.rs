// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The contract shared by the virtualization controllers.

/// Where rows come from and what they show.
///
/// The controller owns the recycled rows; the binder creates them and moves
/// data in and out of them. A row is bound to at most one index at a time and
/// is always unbound before it is bound again or destroyed.
pub trait CollectionBinder {
    /// The host's row visual.
    type Item;

    /// Number of logical items.
    fn item_count(&self) -> usize;

    /// Create an unbound row.
    fn make_item(&mut self) -> Self::Item;

    /// Show item `index` in `item`.
    fn bind_item(&mut self, item: &mut Self::Item, index: usize);

    /// Release whatever `bind_item` set up for `index`.
    fn unbind_item(&mut self, item: &mut Self::Item, index: usize);

    /// Dispose of a row leaving the pool. The row is already unbound.
    fn destroy_item(&mut self, item: Self::Item);
}

/// The row type of a binder.
pub type ItemOf<B> = <B as CollectionBinder>::Item;

/// A pooled row and the index it currently shows.
#[derive(Clone, Debug)]
pub struct RecycledItem<T> {
    pub(crate) item: T,
    pub(crate) index: Option<usize>,
    pub(crate) top: f64,
    pub(crate) height: f64,
}

impl<T> RecycledItem<T> {
    pub(crate) fn new(item: T) -> Self {
        Self {
            item,
            index: None,
            top: 0.0,
            height: 0.0,
        }
    }

    /// The host visual.
    pub fn item(&self) -> &T {
        &self.item
    }

    /// The host visual, mutably.
    pub fn item_mut(&mut self) -> &mut T {
        &mut self.item
    }

    /// Bound index, `None` for a row parked past the end of the collection.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Top edge in content coordinates.
    pub fn top(&self) -> f64 {
        self.top
    }

    /// Height the row is laid out with.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Bottom edge in content coordinates.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// What [`CollectionVirtualizationController::scroll_to_item`] should reveal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScrollTarget {
    /// The item at this index.
    Index(usize),
    /// The end of the list.
    Last,
}

/// A window of recycled rows covering the viewport of a scrolling list.
///
/// The window is contiguous and ascending: the bound rows of
/// [`active_items`](Self::active_items) show consecutive indices, and rows
/// parked past the end of the collection come last. No index is shown by
/// more than one row, and a row is rebound only when the index it shows
/// changes; moving a row is a geometry update.
pub trait CollectionVirtualizationController {
    /// Source of rows and data.
    type Binder: CollectionBinder;

    /// The binder.
    fn binder(&self) -> &Self::Binder;

    /// The binder, mutably. Call [`refresh`](Self::refresh) after changing the data.
    fn binder_mut(&mut self) -> &mut Self::Binder;

    /// The pooled rows, in index order.
    fn active_items(&self) -> &[RecycledItem<ItemOf<Self::Binder>>];

    /// Index of the item at the top of the viewport.
    fn first_visible_index(&self) -> usize;

    /// Height of the viewport.
    fn viewport_height(&self) -> f64;

    /// Current scroll offset.
    fn scroll_offset(&self) -> f64;

    /// Height of the whole list.
    fn content_height(&self) -> f64;

    /// Height of the item at `index`, measured or estimated.
    fn item_height(&self, index: usize) -> f64;

    /// Top edge of the item at `index` in content coordinates.
    fn offset_of(&self, index: usize) -> f64;

    /// Index of the item at content coordinate `y`.
    fn index_from_position(&self, y: f64) -> usize;

    /// The viewport changed height. Non-finite or non-positive heights are ignored.
    fn resize(&mut self, viewport_height: f64);

    /// Scroll to `offset`, clamped to the scrollable range.
    fn on_scroll(&mut self, offset: f64);

    /// Scroll the least amount that reveals `target`.
    fn scroll_to_item(&mut self, target: ScrollTarget);

    /// Rebind every row after a data change. With `rebuild`, every row is
    /// destroyed and the pool is made again.
    fn refresh(&mut self, rebuild: bool);

    /// Rebind the row showing `index`, if any, because its data changed.
    fn replace_active_item(&mut self, index: usize) -> bool;

    /// Take the item at `index` out of the flow while it is dragged.
    fn set_dragged_index(&mut self, index: Option<usize>) {
        let _ = index;
    }

    /// The item taken out of the flow, if any.
    fn dragged_index(&self) -> Option<usize> {
        None
    }

    /// Number of logical items.
    fn item_count(&self) -> usize {
        self.binder().item_count()
    }

    /// Largest valid scroll offset.
    fn max_scroll_offset(&self) -> f64 {
        (self.content_height() - self.viewport_height()).max(0.0)
    }

    /// The pooled row showing `index`.
    fn active_item(&self, index: usize) -> Option<&RecycledItem<ItemOf<Self::Binder>>> {
        self.active_items().iter().find(|r| r.index == Some(index))
    }

    /// The bound row under content coordinate `y`, ignoring a dragged row.
    fn item_at_position(&self, y: f64) -> Option<&RecycledItem<ItemOf<Self::Binder>>> {
        let dragged = self.dragged_index();
        self.active_items().iter().find(|r| {
            r.index.is_some() && r.index != dragged && r.top <= y && y < r.bottom()
        })
    }
}

/// Bind `row` to `index`, or park it when `index` is past `count`.
///
/// Returns `true` if the row was rebound.
pub(crate) fn setup_item<B: CollectionBinder>(
    binder: &mut B,
    row: &mut RecycledItem<B::Item>,
    index: usize,
    count: usize,
) -> bool {
    let wanted = (index < count).then_some(index);
    if row.index == wanted {
        return false;
    }
    if let Some(old) = row.index.take() {
        binder.unbind_item(&mut row.item, old);
    }
    if let Some(new) = wanted {
        binder.bind_item(&mut row.item, new);
    }
    row.index = wanted;
    true
}

/// Unbind and destroy a row leaving the pool.
pub(crate) fn release_item<B: CollectionBinder>(binder: &mut B, mut row: RecycledItem<B::Item>) {
    if let Some(index) = row.index.take() {
        binder.unbind_item(&mut row.item, index);
    }
    binder.destroy_item(row.item);
}

/// Unbind `row` and leave it in the pool.
pub(crate) fn park_item<B: CollectionBinder>(binder: &mut B, row: &mut RecycledItem<B::Item>) {
    if let Some(index) = row.index.take() {
        binder.unbind_item(&mut row.item, index);
    }
}

/// Unbind and rebind `row` in place.
pub(crate) fn rebind_item<B: CollectionBinder>(binder: &mut B, row: &mut RecycledItem<B::Item>) {
    if let Some(index) = row.index {
        binder.unbind_item(&mut row.item, index);
        binder.bind_item(&mut row.item, index);
    }
}

/// Move rows between head and tail so the window starts at `first`; rows
/// whose index is still in the window keep it.
pub(crate) fn rotate_window<T>(rows: &mut [RecycledItem<T>], first: usize) {
    let Some(head) = rows.first().and_then(|r| r.index) else {
        return;
    };
    let len = rows.len();
    if first < head {
        rows.rotate_right((head - first).min(len));
    } else if first > head {
        rows.rotate_left((first - head).min(len));
    }
}

/// Scroll offset revealing the span `[top, top + height)` with the least movement.
pub(crate) fn reveal_offset(current: f64, viewport: f64, top: f64, height: f64) -> f64 {
    if top < current {
        top
    } else if top + height > current + viewport {
        top + height - viewport
    } else {
        current
    }
}

/// Whether a geometry value can be used: finite and positive.
pub(crate) fn is_ready(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Index of the slot containing `value` on a grid of `step`, saturating at zero.
#[expect(
    clippy::cast_possible_truncation,
    reason = "float to index casts saturate and values are clamped first"
)]
pub(crate) fn grid_index(value: f64, step: f64) -> usize {
    if !is_ready(step) || !is_ready(value) {
        return 0;
    }
    (value / step).floor() as usize
}

/// Number of `step`-sized slots needed to cover `extent`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "float to index casts saturate and values are clamped first"
)]
pub(crate) fn grid_count(extent: f64, step: f64) -> usize {
    if !is_ready(step) || !is_ready(extent) {
        return 0;
    }
    (extent / step).ceil() as usize
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::CollectionBinder;

    /// A row that remembers what it shows.
    #[derive(Debug)]
    pub(crate) struct Row {
        pub(crate) id: usize,
        pub(crate) shows: Option<usize>,
    }

    /// Counts binder traffic and checks that rows are never double bound.
    #[derive(Debug, Default)]
    pub(crate) struct CountingBinder {
        pub(crate) count: usize,
        pub(crate) made: usize,
        pub(crate) destroyed: usize,
        pub(crate) binds: usize,
        pub(crate) unbinds: usize,
    }

    impl CountingBinder {
        pub(crate) fn new(count: usize) -> Self {
            Self {
                count,
                ..Self::default()
            }
        }

        pub(crate) fn reset_counts(&mut self) {
            self.binds = 0;
            self.unbinds = 0;
        }
    }

    impl CollectionBinder for CountingBinder {
        type Item = Row;

        fn item_count(&self) -> usize {
            self.count
        }

        fn make_item(&mut self) -> Row {
            self.made += 1;
            Row {
                id: self.made,
                shows: None,
            }
        }

        fn bind_item(&mut self, item: &mut Row, index: usize) {
            assert_eq!(item.shows, None, "row {} bound twice", item.id);
            item.shows = Some(index);
            self.binds += 1;
        }

        fn unbind_item(&mut self, item: &mut Row, index: usize) {
            assert_eq!(item.shows, Some(index), "row {} unbound from the wrong index", item.id);
            item.shows = None;
            self.unbinds += 1;
        }

        fn destroy_item(&mut self, item: Row) {
            assert_eq!(item.shows, None, "row {} destroyed while bound", item.id);
            self.destroyed += 1;
        }
    }
}

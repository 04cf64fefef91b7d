// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Virtualization for rows measured after layout.
//!
//! Heights are unknown until the host reports them. Unmeasured rows are laid
//! out with the running average of the measured ones, so the scroll range stays
//! plausible while measurements arrive. Each measurement updates the cache, and
//! once no freshly bound row is still waiting for its first measurement the
//! controller reconciles the scroll offset: the item at the top of the viewport
//! keeps its position, or the view stays pinned to the end when it was there.

use core::fmt;

use hashbrown::{HashMap, HashSet};
use trellis_timing::{ScheduledItemId, TimerEventScheduler};

use crate::controller::{
    CollectionBinder, CollectionVirtualizationController, ItemOf, RecycledItem, ScrollTarget,
    grid_count, grid_index, is_ready, park_item, rebind_item, release_item, reveal_offset,
    rotate_window, setup_item,
};

const OVERSCAN_ROWS: usize = 2;

/// Default tolerance for [`DynamicHeightVirtualizationController::is_at_bottom`].
pub const DEFAULT_ANCHOR_EPSILON: f64 = 1.0;

/// Height changes smaller than this do not relayout.
///
/// Kept for parity with existing hosts; the value is not derived from any
/// precision analysis.
const HEIGHT_CHANGE_EPSILON: f64 = 1e-30;

/// Measured heights and the running average standing in for the rest.
#[derive(Clone, Debug)]
struct HeightCache {
    heights: HashMap<usize, f64>,
    accumulated: f64,
    default_height: f64,
    dragged: Option<usize>,
}

impl HeightCache {
    fn new(default_height: f64) -> Self {
        Self {
            heights: HashMap::new(),
            accumulated: 0.0,
            default_height,
            dragged: None,
        }
    }

    fn average(&self) -> f64 {
        if self.heights.is_empty() {
            self.default_height
        } else {
            self.accumulated / self.heights.len() as f64
        }
    }

    fn get(&self, index: usize) -> f64 {
        self.heights
            .get(&index)
            .copied()
            .unwrap_or_else(|| self.average())
    }

    /// Height in the flow: zero for the dragged item.
    fn laid_out(&self, index: usize) -> f64 {
        if self.dragged == Some(index) {
            0.0
        } else {
            self.get(index)
        }
    }

    fn register(&mut self, index: usize, height: f64) -> Option<f64> {
        let old = self.heights.insert(index, height);
        self.accumulated += height - old.unwrap_or(0.0);
        old
    }

    fn unregister(&mut self, index: usize) -> Option<f64> {
        let old = self.heights.remove(&index)?;
        self.accumulated -= old;
        if self.heights.is_empty() {
            self.accumulated = 0.0;
        }
        Some(old)
    }

    fn prune(&mut self, count: usize) {
        self.heights.retain(|&index, _| index < count);
        self.accumulated = self.heights.values().sum();
    }

    fn clear(&mut self) {
        self.heights.clear();
        self.accumulated = 0.0;
    }

    fn content_height(&self, count: usize) -> f64 {
        let unmeasured = count.saturating_sub(self.heights.len());
        self.accumulated + unmeasured as f64 * self.average()
    }

    fn offset_of(&self, index: usize) -> f64 {
        let mut measured = 0;
        let mut offset = 0.0;
        for (&at, &height) in &self.heights {
            if at < index {
                measured += 1;
                offset += height;
            }
        }
        offset += (index - measured) as f64 * self.average();
        if let Some(dragged) = self.dragged.filter(|&d| d < index) {
            offset -= self.get(dragged);
        }
        offset
    }

    fn index_at(&self, y: f64) -> usize {
        if !is_ready(y) {
            return 0;
        }
        let average = self.average();
        // Measured and dragged items break the average-height runs.
        let mut breaks: Vec<usize> = self.heights.keys().copied().chain(self.dragged).collect();
        breaks.sort_unstable();
        breaks.dedup();

        let mut index = 0;
        let mut top = 0.0;
        for at in breaks {
            let run = (at - index) as f64 * average;
            if y < top + run {
                return index + grid_index(y - top, average);
            }
            top += run;
            let height = self.laid_out(at);
            if y < top + height {
                return at;
            }
            top += height;
            index = at + 1;
        }
        index + grid_index(y - top, average)
    }
}

/// Recycles rows of a list whose items have different, measured heights.
///
/// The host reports measurements with
/// [`on_item_geometry_changed`](Self::on_item_geometry_changed) and runs
/// [`fill`](Self::fill) when [`needs_fill`](Self::needs_fill) says the pool
/// no longer covers the viewport, directly or through
/// [`schedule_fill`](Self::schedule_fill).
pub struct DynamicHeightVirtualizationController<B: CollectionBinder> {
    binder: B,
    cache: HeightCache,
    viewport_height: f64,
    scroll_offset: f64,
    first_visible_index: usize,
    /// Scroll offset relative to the top of the first visible item.
    anchor_delta: f64,
    at_bottom: bool,
    stick_to_bottom: bool,
    anchor_epsilon: f64,
    rows: Vec<RecycledItem<B::Item>>,
    waiting_for_geometry: HashSet<usize>,
    fill_requested: bool,
    fill_scheduled: Option<ScheduledItemId>,
}

impl<B: CollectionBinder> fmt::Debug for DynamicHeightVirtualizationController<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicHeightVirtualizationController")
            .field("cache", &self.cache)
            .field("viewport_height", &self.viewport_height)
            .field("scroll_offset", &self.scroll_offset)
            .field("first_visible_index", &self.first_visible_index)
            .field("anchor_delta", &self.anchor_delta)
            .field("at_bottom", &self.at_bottom)
            .field("stick_to_bottom", &self.stick_to_bottom)
            .field("anchor_epsilon", &self.anchor_epsilon)
            .field("rows", &self.rows.len())
            .field("waiting_for_geometry", &self.waiting_for_geometry)
            .field("fill_requested", &self.fill_requested)
            .field("fill_scheduled", &self.fill_scheduled)
            .finish_non_exhaustive()
    }
}

impl<B: CollectionBinder> DynamicHeightVirtualizationController<B> {
    /// Create a controller that estimates unmeasured rows at `default_height`
    /// until the first measurement arrives.
    ///
    /// # Panics
    ///
    /// If `default_height` is not finite and positive.
    pub fn new(binder: B, default_height: f64) -> Self {
        assert!(
            is_ready(default_height),
            "default item height must be finite and positive, got {default_height}"
        );
        Self {
            binder,
            cache: HeightCache::new(default_height),
            viewport_height: 0.0,
            scroll_offset: 0.0,
            first_visible_index: 0,
            anchor_delta: 0.0,
            at_bottom: true,
            stick_to_bottom: false,
            anchor_epsilon: DEFAULT_ANCHOR_EPSILON,
            rows: Vec::new(),
            waiting_for_geometry: HashSet::new(),
            fill_requested: false,
            fill_scheduled: None,
        }
    }

    /// Record the measured height of `index`. Unusable heights are ignored.
    ///
    /// This only updates the cache; use
    /// [`on_item_geometry_changed`](Self::on_item_geometry_changed) for
    /// measurements that should move rows.
    pub fn register_height(&mut self, index: usize, height: f64) -> bool {
        if !is_ready(height) {
            return false;
        }
        self.cache.register(index, height);
        true
    }

    /// Forget the measured height of `index`. It falls back to the average.
    pub fn unregister_height(&mut self, index: usize) -> Option<f64> {
        self.cache.unregister(index)
    }

    /// Whether `index` has a measured height.
    pub fn is_measured(&self, index: usize) -> bool {
        self.cache.heights.contains_key(&index)
    }

    /// The estimate used for unmeasured items.
    pub fn average_item_height(&self) -> f64 {
        self.cache.average()
    }

    /// Keep the view pinned to the end when it is there and content changes height.
    pub fn set_stick_to_bottom(&mut self, stick: bool) {
        self.stick_to_bottom = stick;
    }

    /// Whether the view follows the end of the content.
    pub fn stick_to_bottom(&self) -> bool {
        self.stick_to_bottom
    }

    /// How far above the end the offset may be and still count as at the bottom.
    pub fn anchor_epsilon(&self) -> f64 {
        self.anchor_epsilon
    }

    /// Set the tolerance for [`is_at_bottom`](Self::is_at_bottom).
    pub fn set_anchor_epsilon(&mut self, epsilon: f64) {
        if epsilon.is_finite() && epsilon >= 0.0 {
            self.anchor_epsilon = epsilon;
        }
    }

    /// Whether the last layout left the view at the end of the content.
    pub fn is_at_bottom(&self) -> bool {
        self.at_bottom
    }

    /// Number of bound rows still waiting for their first measurement.
    pub fn pending_geometry_count(&self) -> usize {
        self.waiting_for_geometry.len()
    }

    /// Whether the row showing `index` is waiting for its first measurement.
    pub fn is_waiting_for_geometry(&self, index: usize) -> bool {
        self.waiting_for_geometry.contains(&index)
    }

    /// Whether the pool is too small to cover the viewport.
    pub fn needs_fill(&self) -> bool {
        self.fill_requested
    }

    /// Unbind and destroy every row.
    pub fn clear(&mut self) {
        for row in self.rows.drain(..) {
            release_item(&mut self.binder, row);
        }
        self.waiting_for_geometry.clear();
    }

    /// A bound row was measured at `height`.
    ///
    /// Non-finite or non-positive heights mean the row is not laid out yet and
    /// are ignored. The scroll offset is reconciled once no other bound row is
    /// waiting for its first measurement.
    pub fn on_item_geometry_changed(&mut self, index: usize, height: f64) {
        if !is_ready(height) || index >= self.binder.item_count() {
            return;
        }
        let old = self.cache.register(index, height);
        self.waiting_for_geometry.remove(&index);
        let unchanged = old.is_some_and(|old| (old - height).abs() < HEIGHT_CHANGE_EPSILON);
        if unchanged || !self.waiting_for_geometry.is_empty() {
            return;
        }
        self.reconcile();
    }

    /// Grow the pool until it covers the viewport or holds every item.
    ///
    /// New rows go after the window, or before it once the window reaches the
    /// end of the collection.
    pub fn fill(&mut self) {
        self.fill_scheduled = None;
        let count = self.binder.item_count();
        let before = self.rows.len();
        while self.rows.len() < count && self.is_short() {
            let item = self.binder.make_item();
            self.rows.push(RecycledItem::new(item));
            self.layout();
        }
        self.fill_requested = false;
        if self.rows.len() != before {
            tracing::debug!(from = before, to = self.rows.len(), "dynamic-height pool filled");
        }
    }

    /// Schedule [`fill`](Self::fill) on the next scheduler pass, unless one
    /// is already scheduled or the pool covers the viewport.
    ///
    /// `controller_of` locates this controller in the scheduler's context.
    pub fn schedule_fill<C: 'static>(
        &mut self,
        scheduler: &mut TimerEventScheduler<C>,
        controller_of: fn(&mut C) -> &mut Self,
    ) -> bool
    where
        B: 'static,
    {
        if !self.fill_requested || self.fill_scheduled.is_some() {
            return false;
        }
        let id = scheduler.schedule_once(0, move |ctx: &mut C, _| controller_of(ctx).fill());
        self.fill_scheduled = Some(id);
        true
    }

    fn wanted_rows(&self) -> usize {
        if !is_ready(self.viewport_height) {
            return 0;
        }
        let visible = grid_count(self.viewport_height, self.cache.average()) + OVERSCAN_ROWS;
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
        tracing::debug!(from = current, to = wanted, "dynamic-height row pool resized");
    }

    /// Whether the bound rows leave part of the viewport uncovered.
    fn is_short(&self) -> bool {
        if !is_ready(self.viewport_height) {
            return false;
        }
        let mut bound = self.rows.iter().filter(|r| r.index.is_some());
        let Some(first) = bound.next() else {
            return self.binder.item_count() > 0;
        };
        let bottom = bound.last().map_or(first.bottom(), RecycledItem::bottom);
        let view_bottom = (self.scroll_offset + self.viewport_height).min(self.content_height());
        first.top > self.scroll_offset || bottom < view_bottom
    }

    fn reconcile(&mut self) {
        let offset = if self.stick_to_bottom && self.at_bottom {
            self.max_scroll_offset()
        } else {
            self.cache.offset_of(self.first_visible_index) + self.anchor_delta
        };
        tracing::trace!(
            from = self.scroll_offset,
            to = offset,
            pinned = self.stick_to_bottom && self.at_bottom,
            "reconciling scroll offset"
        );
        self.scroll_offset = offset;
        self.layout();
    }

    /// Clamp the offset, rotate the pool onto the new window and bind what changed.
    ///
    /// The window starts at the first visible item, or earlier when that would
    /// leave rows past the end of the collection.
    fn layout(&mut self) {
        let count = self.binder.item_count();
        let max = self.max_scroll_offset();
        self.scroll_offset = self.scroll_offset.clamp(0.0, max);
        let visible = self
            .cache
            .index_at(self.scroll_offset)
            .min(count.saturating_sub(1));
        self.first_visible_index = visible;
        self.anchor_delta = self.scroll_offset - self.cache.offset_of(visible);
        self.at_bottom = self.scroll_offset + self.anchor_epsilon >= max;

        let start = visible.min(count.saturating_sub(self.rows.len()));
        rotate_window(&mut self.rows, start);
        let mut top = self.cache.offset_of(start);
        for (slot, row) in self.rows.iter_mut().enumerate() {
            let index = start + slot;
            let rebound = setup_item(&mut self.binder, row, index, count);
            if rebound && index < count && !self.cache.heights.contains_key(&index) {
                self.waiting_for_geometry.insert(index);
            }
            let height = if index < count {
                self.cache.laid_out(index)
            } else {
                0.0
            };
            row.top = top;
            row.height = height;
            top += height;
        }
        self.waiting_for_geometry
            .retain(|&index| self.rows.iter().any(|r| r.index == Some(index)));
        self.fill_requested = self.rows.len() < count && self.is_short();
    }
}

impl<B: CollectionBinder> CollectionVirtualizationController
    for DynamicHeightVirtualizationController<B>
{
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
        self.cache.content_height(self.binder.item_count())
    }

    fn item_height(&self, index: usize) -> f64 {
        self.cache.get(index)
    }

    fn offset_of(&self, index: usize) -> f64 {
        self.cache.offset_of(index)
    }

    fn index_from_position(&self, y: f64) -> usize {
        self.cache.index_at(y)
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
            self.cache.offset_of(index),
            self.cache.laid_out(index),
        );
        self.on_scroll(offset);
    }

    fn refresh(&mut self, rebuild: bool) {
        if rebuild {
            self.clear();
            self.cache.clear();
        } else {
            for row in &mut self.rows {
                park_item(&mut self.binder, row);
            }
            self.waiting_for_geometry.clear();
            self.cache.prune(self.binder.item_count());
        }
        if self
            .cache
            .dragged
            .is_some_and(|d| d >= self.binder.item_count())
        {
            self.cache.dragged = None;
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

    fn set_dragged_index(&mut self, index: Option<usize>) {
        if self.cache.dragged == index {
            return;
        }
        self.cache.dragged = index.filter(|&i| i < self.binder.item_count());
        self.layout();
    }

    fn dragged_index(&self) -> Option<usize> {
        self.cache.dragged
    }
}

// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag reordering that parts the list at the insertion point.
//!
//! Instead of a drop line, [`ListViewDraggerAnimated`] takes the dragged row
//! out of the flow and opens a gap of its height above the row at the
//! insertion point by animating that row's top padding. The dragged row
//! follows the pointer as an overlay clamped to the content.
//!
//! Animations are linear and evaluated on demand: the host advances time with
//! [`ListViewDraggerAnimated::update`] and reads
//! [`ListViewDraggerAnimated::padding_top`] when it lays rows out.

use hashbrown::HashMap;
use kurbo::Point;

use crate::controller::CollectionVirtualizationController;
use crate::drag::{DragAndDropController, DragSettings, DragVisualMode, ListViewDragger};

/// Duration of a padding animation.
pub const PADDING_ANIMATION_MS: u64 = 500;

#[derive(Copy, Clone, Debug, PartialEq)]
struct PaddingAnimation {
    from: f64,
    to: f64,
    start_ms: u64,
}

impl PaddingAnimation {
    fn value_at(&self, now_ms: u64) -> f64 {
        let elapsed = now_ms.saturating_sub(self.start_ms);
        let t = (elapsed as f64 / PADDING_ANIMATION_MS as f64).min(1.0);
        self.from + (self.to - self.from) * t
    }

    fn is_done(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.start_ms) >= PADDING_ANIMATION_MS
    }
}

/// A [`ListViewDragger`] for single rows that animates the list apart.
///
/// Use it with a list controller that honors
/// [`set_dragged_index`](CollectionVirtualizationController::set_dragged_index),
/// such as [`DynamicHeightVirtualizationController`](crate::DynamicHeightVirtualizationController),
/// so rows beneath the dragged one close up.
#[derive(Debug)]
pub struct ListViewDraggerAnimated<D> {
    dragger: ListViewDragger<D>,
    now_ms: u64,
    dragged: Option<usize>,
    /// Pointer distance below the top of the dragged row at press time.
    grab_offset: f64,
    overlay_top: f64,
    parted: Option<usize>,
    animations: HashMap<usize, PaddingAnimation>,
}

impl<D: DragAndDropController> ListViewDraggerAnimated<D> {
    /// Create a dragger with default settings.
    pub fn new(controller: D) -> Self {
        Self::with_settings(controller, DragSettings::default())
    }

    /// Create a dragger with custom settings.
    pub fn with_settings(controller: D, settings: DragSettings) -> Self {
        Self {
            dragger: ListViewDragger::with_settings(controller, settings),
            now_ms: 0,
            dragged: None,
            grab_offset: 0.0,
            overlay_top: 0.0,
            parted: None,
            animations: HashMap::new(),
        }
    }

    /// The underlying pointer protocol.
    pub fn dragger(&self) -> &ListViewDragger<D> {
        &self.dragger
    }

    /// The drag-and-drop controller.
    pub fn controller(&self) -> &D {
        self.dragger.controller()
    }

    /// The drag-and-drop controller, mutably.
    pub fn controller_mut(&mut self) -> &mut D {
        self.dragger.controller_mut()
    }

    /// Advance animation time and drop finished animations that closed a gap.
    pub fn update(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        self.animations
            .retain(|_, a| !(a.is_done(now_ms) && a.to == 0.0));
    }

    /// Whether any padding is still moving.
    pub fn is_animating(&self) -> bool {
        self.animations.values().any(|a| !a.is_done(self.now_ms))
    }

    /// Extra top padding for the row showing `index`.
    pub fn padding_top(&self, index: usize) -> f64 {
        self.animations
            .get(&index)
            .map_or(0.0, |a| a.value_at(self.now_ms))
    }

    /// The item whose row currently carries the gap.
    pub fn parted_index(&self) -> Option<usize> {
        self.parted
    }

    /// The item being dragged.
    pub fn dragged_index(&self) -> Option<usize> {
        self.dragged
    }

    /// Top of the dragged row's overlay in content coordinates.
    pub fn overlay_top(&self) -> Option<f64> {
        self.dragged.map(|_| self.overlay_top)
    }

    /// A pointer went down at `position`. Only the pressed row is dragged.
    pub fn on_pointer_down<L>(&mut self, list: &L, position: Point) -> bool
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        self.finish(None::<&mut L>);
        if !self.dragger.on_pointer_down(list, position, &[]) {
            return false;
        }
        if let Some(&index) = self.dragger.dragged_indices().first() {
            self.grab_offset = position.y + list.scroll_offset() - list.offset_of(index);
        }
        true
    }

    /// The pointer moved. Returns the feedback once the drag has started.
    pub fn on_pointer_move<L>(&mut self, list: &mut L, position: Point) -> Option<DragVisualMode>
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        let mut mode = self.dragger.on_pointer_move(list, position)?;
        if self.dragged.is_none() {
            let index = *self.dragger.dragged_indices().first()?;
            self.dragged = Some(index);
            list.set_dragged_index(Some(index));
            // The rows below closed up under the pointer.
            mode = self.dragger.retarget(list).unwrap_or(mode);
        }
        self.track_overlay(list, position);
        self.part(list, mode);
        Some(mode)
    }

    /// The pointer was released. Drops if accepted and puts the row back.
    pub fn on_pointer_up<L>(&mut self, list: &mut L, position: Point) -> Option<DragVisualMode>
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        let mode = self.dragger.on_pointer_up(list, position);
        self.finish(Some(list));
        mode
    }

    /// The pointer was cancelled. Puts the row back without a drop.
    pub fn on_pointer_cancel<L>(&mut self, list: &mut L)
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        self.dragger.on_pointer_cancel();
        self.finish(Some(list));
    }

    fn track_overlay<L>(&mut self, list: &L, position: Point)
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        let Some(index) = self.dragged else {
            return;
        };
        let height = list.item_height(index);
        let max = (list.content_height() - height).max(0.0);
        let top = position.y + list.scroll_offset() - self.grab_offset;
        self.overlay_top = top.clamp(0.0, max);
    }

    /// Move the gap to the row at the insertion point.
    fn part<L>(&mut self, list: &L, mode: DragVisualMode)
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        let Some(dragged) = self.dragged else {
            return;
        };
        let count = list.item_count();
        let parted = self
            .dragger
            .drag_position()
            .filter(|_| mode.accepts_drop())
            .map(|target| {
                // Inserting before the dragged row leaves it where it was.
                if target.insert_at_index == dragged {
                    dragged + 1
                } else {
                    target.insert_at_index
                }
            })
            .filter(|&index| index < count);
        if parted == self.parted {
            return;
        }

        let now_ms = self.now_ms;
        if let Some(old) = self.parted {
            let from = self.padding_top(old);
            self.animations.insert(
                old,
                PaddingAnimation {
                    from,
                    to: 0.0,
                    start_ms: now_ms,
                },
            );
        }
        if let Some(new) = parted {
            let from = self.padding_top(new);
            self.animations.insert(
                new,
                PaddingAnimation {
                    from,
                    to: list.item_height(dragged),
                    start_ms: now_ms,
                },
            );
        }
        tracing::trace!(from = ?self.parted, to = ?parted, "list parted");
        self.parted = parted;
    }

    fn finish<L>(&mut self, list: Option<&mut L>)
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        if let (Some(list), Some(_)) = (list, self.dragged) {
            list.set_dragged_index(None);
        }
        self.dragged = None;
        self.parted = None;
        self.grab_offset = 0.0;
        self.overlay_top = 0.0;
        self.animations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::test_support::CountingBinder;
    use crate::drag::{DragArgs, StartDragArgs};
    use crate::dynamic::DynamicHeightVirtualizationController;

    #[derive(Debug, Default)]
    struct AcceptAll {
        drops: usize,
    }

    impl DragAndDropController for AcceptAll {
        fn can_start_drag(&self, _indices: &[usize]) -> bool {
            true
        }

        fn setup_drag_and_drop(&mut self, _indices: &[usize]) -> StartDragArgs {
            StartDragArgs::default()
        }

        fn handle_drag_and_drop(&mut self, _args: &DragArgs) -> DragVisualMode {
            DragVisualMode::Move
        }

        fn on_drop(&mut self, _args: &DragArgs) {
            self.drops += 1;
        }
    }

    type List = DynamicHeightVirtualizationController<CountingBinder>;

    fn list() -> List {
        let mut list = DynamicHeightVirtualizationController::new(CountingBinder::new(20), 20.0);
        for index in 0..20 {
            list.register_height(index, 20.0);
        }
        list.resize(200.0);
        list
    }

    fn at(y: f64) -> Point {
        Point::new(10.0, y)
    }

    #[test]
    fn gap_follows_the_insertion_point() {
        let mut list = list();
        let mut dragger = ListViewDraggerAnimated::new(AcceptAll::default());
        assert!(dragger.on_pointer_down(&list, at(10.0)));
        assert_eq!(dragger.dragged_index(), None);

        dragger.on_pointer_move(&mut list, at(70.0));
        assert_eq!(dragger.dragged_index(), Some(0));
        assert_eq!(list.dragged_index(), Some(0));
        // Rows below the dragged one closed up: 70 is over item 4.
        assert_eq!(dragger.parted_index(), Some(4));
        assert_eq!(dragger.overlay_top(), Some(60.0));

        dragger.update(250);
        assert_eq!(dragger.padding_top(4), 10.0);
        assert!(dragger.is_animating());
        dragger.update(500);
        assert_eq!(dragger.padding_top(4), 20.0);
        assert!(!dragger.is_animating());

        dragger.on_pointer_move(&mut list, at(15.0));
        assert_eq!(dragger.parted_index(), Some(2));
        dragger.update(750);
        assert_eq!(dragger.padding_top(4), 10.0);
        assert_eq!(dragger.padding_top(2), 10.0);
        dragger.update(1_000);
        assert_eq!(dragger.padding_top(4), 0.0);
        assert_eq!(dragger.padding_top(2), 20.0);
        assert_eq!(dragger.padding_top(7), 0.0);
    }

    #[test]
    fn overlay_stays_inside_the_content() {
        let mut list = list();
        let mut dragger = ListViewDraggerAnimated::new(AcceptAll::default());
        dragger.on_pointer_down(&list, at(50.0));
        dragger.on_pointer_move(&mut list, at(-40.0));
        assert_eq!(dragger.overlay_top(), Some(0.0));
        assert_eq!(dragger.parted_index(), Some(0));

        // Dropping back into its own slot parts the row after it.
        dragger.on_pointer_move(&mut list, at(37.0));
        assert_eq!(dragger.dragger().drag_position().map(|p| p.insert_at_index), Some(2));
        assert_eq!(dragger.parted_index(), Some(3));

        list.on_scroll(1e9);
        dragger.on_pointer_move(&mut list, at(199.0));
        assert_eq!(dragger.overlay_top(), Some(380.0));
        assert_eq!(dragger.parted_index(), None);
    }

    #[test]
    fn release_puts_the_row_back() {
        let mut list = list();
        let mut dragger = ListViewDraggerAnimated::new(AcceptAll::default());
        dragger.on_pointer_down(&list, at(10.0));
        dragger.on_pointer_move(&mut list, at(70.0));
        assert_eq!(dragger.on_pointer_up(&mut list, at(70.0)), Some(DragVisualMode::Move));
        assert_eq!(dragger.controller().drops, 1);
        assert_eq!(list.dragged_index(), None);
        assert_eq!(dragger.overlay_top(), None);
        assert_eq!(dragger.padding_top(4), 0.0);

        dragger.on_pointer_down(&list, at(10.0));
        dragger.on_pointer_move(&mut list, at(70.0));
        dragger.on_pointer_cancel(&mut list);
        assert_eq!(list.dragged_index(), None);
        assert_eq!(dragger.controller().drops, 1);
    }
}

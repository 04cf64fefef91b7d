// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag reordering for virtualized lists.
//!
//! [`ListViewDragger`] turns pointer input over a list into drag-and-drop
//! sessions. It owns the pointer protocol (threshold, edge auto-scroll, drop
//! target classification) and leaves every decision about the data to a
//! [`DragAndDropController`].
//!
//! Pointer positions are in viewport coordinates: `y == 0` is the top edge of
//! the visible area, whatever the scroll offset.

use kurbo::Point;
use trellis_event::drag::{DEFAULT_DRAG_THRESHOLD, DragPhase, DragState, DragUpdate};
use trellis_timing::{ScheduledItemId, TimerEventScheduler};

use crate::controller::CollectionVirtualizationController;

/// Pixel tuning of a [`ListViewDragger`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DragSettings {
    /// Movement along either axis that turns a press into a drag.
    pub threshold: f64,
    /// Height of the viewport edge bands that auto-scroll.
    pub auto_scroll_band: f64,
    /// Scroll distance per auto-scroll step.
    pub pan_speed: f64,
    /// Time between scheduled auto-scroll steps.
    pub auto_scroll_interval_ms: u64,
    /// Height of the top and bottom band of a row that count as between items.
    pub between_items_band: f64,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DRAG_THRESHOLD,
            auto_scroll_band: 5.0,
            pan_speed: 20.0,
            auto_scroll_interval_ms: 16,
            between_items_band: 5.0,
        }
    }
}

/// How the pointer relates to the rows under it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DropPosition {
    /// Over the middle of a row.
    OverItem,
    /// In the band between two rows.
    BetweenItems,
    /// Above the first row or below the last one.
    OutsideItems,
}

/// Where a drop would land.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DragPosition {
    /// Index the dragged items would be inserted before.
    pub insert_at_index: usize,
    /// The row under the pointer, if any.
    pub hovered_index: Option<usize>,
    /// Classification of the pointer position.
    pub drop_position: DropPosition,
}

/// Feedback the drag-and-drop controller gives for the current target.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DragVisualMode {
    /// No feedback; a drop does nothing.
    #[default]
    None,
    /// Dropping copies the items.
    Copy,
    /// Dropping moves the items.
    Move,
    /// The target refuses the items.
    Rejected,
}

impl DragVisualMode {
    /// Whether a drop with this feedback is performed.
    pub fn accepts_drop(self) -> bool {
        matches!(self, Self::Copy | Self::Move)
    }
}

/// What the drag-and-drop controller hands back when a drag starts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StartDragArgs {
    /// Label for the drag preview.
    pub title: String,
}

/// The state of a drag, as seen by the drag-and-drop controller.
#[derive(Clone, Debug, PartialEq)]
pub struct DragArgs {
    /// Pointer position in viewport coordinates.
    pub position: Point,
    /// Where the items would land.
    pub target: DragPosition,
    /// Dragged indices, ascending.
    pub indices: Vec<usize>,
}

/// Decides what may be dragged and what a drop does.
pub trait DragAndDropController {
    /// Whether a drag of `indices` may start.
    fn can_start_drag(&self, indices: &[usize]) -> bool;

    /// A drag of `indices` crossed the threshold.
    fn setup_drag_and_drop(&mut self, indices: &[usize]) -> StartDragArgs;

    /// The drag moved; report how a drop here would be handled.
    fn handle_drag_and_drop(&mut self, args: &DragArgs) -> DragVisualMode;

    /// Perform an accepted drop.
    fn on_drop(&mut self, args: &DragArgs);
}

/// Where a host draws drop feedback, in content coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DropIndicator {
    /// A line between rows at `y`.
    Line {
        /// Vertical position of the line.
        y: f64,
    },
    /// A highlight on the row at `index`.
    Item {
        /// The highlighted row.
        index: usize,
    },
}

/// Drives drag-and-drop reordering over a list.
///
/// Feed it pointer events for the list viewport; it calls back into its
/// [`DragAndDropController`] as the drag progresses.
#[derive(Debug)]
pub struct ListViewDragger<D> {
    controller: D,
    settings: DragSettings,
    drag: DragState,
    indices: Vec<usize>,
    title: String,
    last_position: Option<Point>,
    target: Option<DragPosition>,
    visual_mode: DragVisualMode,
    auto_scroll_timer: Option<ScheduledItemId>,
}

impl<D: DragAndDropController> ListViewDragger<D> {
    /// Create a dragger with default settings.
    pub fn new(controller: D) -> Self {
        Self::with_settings(controller, DragSettings::default())
    }

    /// Create a dragger with custom settings.
    pub fn with_settings(controller: D, settings: DragSettings) -> Self {
        Self {
            controller,
            settings,
            drag: DragState::new(settings.threshold),
            indices: Vec::new(),
            title: String::new(),
            last_position: None,
            target: None,
            visual_mode: DragVisualMode::None,
            auto_scroll_timer: None,
        }
    }

    /// The drag-and-drop controller.
    pub fn controller(&self) -> &D {
        &self.controller
    }

    /// The drag-and-drop controller, mutably.
    pub fn controller_mut(&mut self) -> &mut D {
        &mut self.controller
    }

    /// Pixel tuning.
    pub fn settings(&self) -> &DragSettings {
        &self.settings
    }

    /// Where the interaction stands.
    pub fn phase(&self) -> DragPhase {
        self.drag.phase()
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Indices being dragged, ascending.
    pub fn dragged_indices(&self) -> &[usize] {
        &self.indices
    }

    /// Preview label from [`DragAndDropController::setup_drag_and_drop`].
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The last computed drop target.
    pub fn drag_position(&self) -> Option<DragPosition> {
        self.target
    }

    /// The controller's feedback for the last drop target.
    pub fn visual_mode(&self) -> DragVisualMode {
        self.visual_mode
    }

    /// Pointer position of the press that started tracking.
    pub fn start_position(&self) -> Option<Point> {
        self.drag.start_position()
    }

    /// A pointer went down at `position`.
    ///
    /// Pressing a selected row drags the whole `selection`, any other row is
    /// dragged alone. Returns `false` when nothing draggable is under the
    /// pointer.
    pub fn on_pointer_down<L>(&mut self, list: &L, position: Point, selection: &[usize]) -> bool
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        self.reset();
        let y = position.y + list.scroll_offset();
        let Some(index) = list.item_at_position(y).and_then(|r| r.index()) else {
            return false;
        };
        let mut indices = if selection.contains(&index) {
            selection.to_vec()
        } else {
            vec![index]
        };
        indices.sort_unstable();
        indices.dedup();
        if !self.controller.can_start_drag(&indices) {
            return false;
        }
        self.indices = indices;
        self.drag.start(position);
        self.last_position = Some(position);
        true
    }

    /// The pointer moved. Returns the feedback once the drag has started.
    pub fn on_pointer_move<L>(&mut self, list: &mut L, position: Point) -> Option<DragVisualMode>
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        match self.drag.update(position) {
            DragUpdate::Idle | DragUpdate::Pending => return None,
            DragUpdate::Started { .. } => {
                let args = self.controller.setup_drag_and_drop(&self.indices);
                self.title = args.title;
                tracing::debug!(indices = ?self.indices, "list drag started");
            }
            DragUpdate::Moved { .. } => {}
        }
        self.last_position = Some(position);
        self.auto_scroll(list);
        Some(self.update_target(list, position))
    }

    /// The pointer was released. Performs the drop if the controller accepts it
    /// and refreshes the list.
    ///
    /// Returns the final feedback, or `None` if no drag had started.
    pub fn on_pointer_up<L>(&mut self, list: &mut L, position: Point) -> Option<DragVisualMode>
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        if !self.drag.is_dragging() {
            self.reset();
            return None;
        }
        let mode = self.update_target(list, position);
        if mode.accepts_drop()
            && let Some(target) = self.target
        {
            let args = DragArgs {
                position,
                target,
                indices: self.indices.clone(),
            };
            tracing::debug!(?target, ?mode, "list drop");
            self.controller.on_drop(&args);
            list.refresh(false);
        }
        self.reset();
        Some(mode)
    }

    /// The pointer was cancelled. Any drag ends without a drop.
    pub fn on_pointer_cancel(&mut self) {
        if self.drag.is_dragging() {
            tracing::debug!("list drag cancelled");
        }
        self.reset();
    }

    /// Whether a scheduled auto-scroll is running.
    pub fn is_auto_scroll_scheduled(&self) -> bool {
        self.auto_scroll_timer.is_some()
    }

    /// Scroll one step if the pointer rests in an edge band of the viewport.
    ///
    /// Runs on every move; [`schedule_auto_scroll`](Self::schedule_auto_scroll)
    /// keeps it running while the pointer does not move. Returns the distance
    /// scrolled.
    pub fn auto_scroll<L>(&mut self, list: &mut L) -> f64
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        let Some(position) = self.last_position.filter(|_| self.drag.is_dragging()) else {
            return 0.0;
        };
        let step = if position.y < self.settings.auto_scroll_band {
            -self.settings.pan_speed
        } else if position.y > list.viewport_height() - self.settings.auto_scroll_band {
            self.settings.pan_speed
        } else {
            return 0.0;
        };
        let before = list.scroll_offset();
        list.on_scroll(before + step);
        list.scroll_offset() - before
    }

    /// Keep auto-scrolling from `scheduler` while the drag lasts.
    ///
    /// Every `auto_scroll_interval_ms` the list scrolls one step if the pointer
    /// rests in an edge band, and the drop target follows the rows moving under
    /// it. The timer stops itself once the drag ends. Returns `false` when no
    /// drag is in progress or a timer is already running.
    ///
    /// `parts_of` locates this dragger and its list in the scheduler's context.
    pub fn schedule_auto_scroll<C: 'static, L>(
        &mut self,
        scheduler: &mut TimerEventScheduler<C>,
        parts_of: fn(&mut C) -> (&mut Self, &mut L),
    ) -> bool
    where
        D: 'static,
        L: CollectionVirtualizationController + ?Sized + 'static,
    {
        if !self.drag.is_dragging() || self.auto_scroll_timer.is_some() {
            return false;
        }
        let id = scheduler.schedule_until(
            0,
            self.settings.auto_scroll_interval_ms,
            move |ctx: &mut C, _| {
                let (dragger, list) = parts_of(ctx);
                if !dragger.drag.is_dragging() {
                    dragger.auto_scroll_timer = None;
                } else if dragger.auto_scroll(list) != 0.0 {
                    dragger.retarget(&*list);
                }
            },
            move |ctx: &mut C| !parts_of(ctx).0.drag.is_dragging(),
        );
        self.auto_scroll_timer = Some(id);
        true
    }

    /// Where a drop at `position` would land, while a drag is in progress.
    pub fn try_get_drag_position<L>(&self, list: &L, position: Point) -> Option<DragPosition>
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        self.drag
            .is_dragging()
            .then(|| classify(list, position, self.settings.between_items_band))
    }

    /// Where to draw feedback for the last drop target.
    pub fn drop_indicator<L>(&self, list: &L) -> Option<DropIndicator>
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        if !self.visual_mode.accepts_drop() {
            return None;
        }
        let target = self.target?;
        Some(match target.drop_position {
            DropPosition::OverItem => DropIndicator::Item {
                index: target.hovered_index?,
            },
            DropPosition::BetweenItems | DropPosition::OutsideItems => {
                let y = if target.insert_at_index >= list.item_count() {
                    list.content_height()
                } else {
                    list.offset_of(target.insert_at_index)
                };
                DropIndicator::Line { y }
            }
        })
    }

    /// Recompute the drop target at the last pointer position, after the
    /// list changed under a resting pointer.
    pub(crate) fn retarget<L>(&mut self, list: &L) -> Option<DragVisualMode>
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        let position = self.last_position.filter(|_| self.drag.is_dragging())?;
        Some(self.update_target(list, position))
    }

    fn update_target<L>(&mut self, list: &L, position: Point) -> DragVisualMode
    where
        L: CollectionVirtualizationController + ?Sized,
    {
        let target = classify(list, position, self.settings.between_items_band);
        let args = DragArgs {
            position,
            target,
            indices: self.indices.clone(),
        };
        self.target = Some(target);
        self.visual_mode = self.controller.handle_drag_and_drop(&args);
        self.visual_mode
    }

    fn reset(&mut self) {
        self.drag.end();
        self.indices.clear();
        self.title.clear();
        self.last_position = None;
        self.target = None;
        self.visual_mode = DragVisualMode::None;
    }
}

/// Classify a viewport position against the rows of `list`.
///
/// Rows are read from the list's offsets, so a row taken out of the flow
/// while dragged has no extent and is never hovered.
pub(crate) fn classify<L>(list: &L, position: Point, band: f64) -> DragPosition
where
    L: CollectionVirtualizationController + ?Sized,
{
    let count = list.item_count();
    let y = position.y + list.scroll_offset();
    let outside = |insert_at_index| DragPosition {
        insert_at_index,
        hovered_index: None,
        drop_position: DropPosition::OutsideItems,
    };
    if count == 0 || y < 0.0 {
        return outside(0);
    }
    if y >= list.content_height() {
        return outside(count);
    }

    let index = list.index_from_position(y).min(count - 1);
    let top = list.offset_of(index);
    let bottom = if index + 1 < count {
        list.offset_of(index + 1)
    } else {
        list.content_height()
    };
    let (insert_at_index, drop_position) = if y < top + band {
        (index, DropPosition::BetweenItems)
    } else if y >= bottom - band {
        (index + 1, DropPosition::BetweenItems)
    } else {
        (index, DropPosition::OverItem)
    };
    DragPosition {
        insert_at_index,
        hovered_index: Some(index),
        drop_position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::test_support::CountingBinder;
    use crate::fixed::FixedHeightVirtualizationController;

    /// Accepts everything between rows and records drops.
    #[derive(Debug, Default)]
    struct Recorder {
        refuse: bool,
        started: Vec<Vec<usize>>,
        drops: Vec<DragArgs>,
    }

    impl DragAndDropController for Recorder {
        fn can_start_drag(&self, _indices: &[usize]) -> bool {
            !self.refuse
        }

        fn setup_drag_and_drop(&mut self, indices: &[usize]) -> StartDragArgs {
            self.started.push(indices.to_vec());
            StartDragArgs {
                title: format!("{} items", indices.len()),
            }
        }

        fn handle_drag_and_drop(&mut self, args: &DragArgs) -> DragVisualMode {
            match args.target.drop_position {
                DropPosition::OverItem => DragVisualMode::Rejected,
                _ => DragVisualMode::Move,
            }
        }

        fn on_drop(&mut self, args: &DragArgs) {
            self.drops.push(args.clone());
        }
    }

    fn list() -> FixedHeightVirtualizationController<CountingBinder> {
        let mut list = FixedHeightVirtualizationController::new(CountingBinder::new(100), 20.0);
        list.resize(200.0);
        list
    }

    fn at(y: f64) -> Point {
        Point::new(10.0, y)
    }

    #[test]
    fn threshold_gates_the_drag() {
        let mut list = list();
        let mut dragger = ListViewDragger::new(Recorder::default());
        assert!(dragger.on_pointer_down(&list, at(50.0), &[]));
        assert_eq!(dragger.phase(), DragPhase::CanStartDrag);
        assert_eq!(dragger.dragged_indices(), [2]);

        assert_eq!(dragger.on_pointer_move(&mut list, Point::new(14.0, 54.0)), None);
        assert!(dragger.controller().started.is_empty());

        assert!(dragger.on_pointer_move(&mut list, Point::new(10.0, 55.0)).is_some());
        assert!(dragger.is_dragging());
        assert_eq!(dragger.controller().started, [vec![2]]);
        assert_eq!(dragger.title(), "1 items");
    }

    #[test]
    fn release_before_the_threshold_is_not_a_drop() {
        let mut list = list();
        let mut dragger = ListViewDragger::new(Recorder::default());
        dragger.on_pointer_down(&list, at(50.0), &[]);
        assert_eq!(dragger.on_pointer_up(&mut list, at(51.0)), None);
        assert_eq!(dragger.phase(), DragPhase::None);
        assert!(dragger.controller().drops.is_empty());
    }

    #[test]
    fn selection_is_dragged_together() {
        let list = list();
        let mut dragger = ListViewDragger::new(Recorder::default());
        dragger.on_pointer_down(&list, at(50.0), &[7, 2, 4]);
        assert_eq!(dragger.dragged_indices(), [2, 4, 7]);
        // Pressing outside the selection drags only the pressed row.
        dragger.on_pointer_down(&list, at(110.0), &[7, 2, 4]);
        assert_eq!(dragger.dragged_indices(), [5]);

        dragger.controller_mut().refuse = true;
        assert!(!dragger.on_pointer_down(&list, at(50.0), &[]));
        assert_eq!(dragger.phase(), DragPhase::None);
    }

    #[test]
    fn positions_are_classified_with_bands() {
        let mut list = list();
        let band = 5.0;
        let classify_at = |list: &FixedHeightVirtualizationController<CountingBinder>, y| {
            let p = classify(list, at(y), band);
            (p.insert_at_index, p.hovered_index, p.drop_position)
        };
        assert_eq!(classify_at(&list, 42.0), (2, Some(2), DropPosition::BetweenItems));
        assert_eq!(classify_at(&list, 50.0), (2, Some(2), DropPosition::OverItem));
        assert_eq!(classify_at(&list, 56.0), (3, Some(2), DropPosition::BetweenItems));
        assert_eq!(classify_at(&list, -3.0), (0, None, DropPosition::OutsideItems));

        list.on_scroll(1e9);
        assert_eq!(classify_at(&list, 190.0), (99, Some(99), DropPosition::OverItem));
        assert_eq!(classify_at(&list, 199.0), (100, Some(99), DropPosition::BetweenItems));
        list.binder_mut().count = 5;
        list.refresh(false);
        assert_eq!(classify_at(&list, 150.0), (5, None, DropPosition::OutsideItems));
    }

    #[test]
    fn accepted_drops_reach_the_controller() {
        let mut list = list();
        let mut dragger = ListViewDragger::new(Recorder::default());
        dragger.on_pointer_down(&list, at(10.0), &[]);
        assert_eq!(
            dragger.on_pointer_move(&mut list, at(50.0)),
            Some(DragVisualMode::Rejected)
        );
        assert_eq!(dragger.drop_indicator(&list), None);
        assert_eq!(
            dragger.on_pointer_move(&mut list, at(81.0)),
            Some(DragVisualMode::Move)
        );
        assert_eq!(
            dragger.drop_indicator(&list),
            Some(DropIndicator::Line { y: 80.0 })
        );

        assert_eq!(
            dragger.on_pointer_up(&mut list, at(81.0)),
            Some(DragVisualMode::Move)
        );
        let drops = &dragger.controller().drops;
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].indices, [0]);
        assert_eq!(drops[0].target.insert_at_index, 4);
        assert_eq!(dragger.phase(), DragPhase::None);
    }

    #[test]
    fn rejected_and_cancelled_drags_do_not_drop() {
        let mut list = list();
        let mut dragger = ListViewDragger::new(Recorder::default());
        dragger.on_pointer_down(&list, at(10.0), &[]);
        dragger.on_pointer_move(&mut list, at(50.0));
        assert_eq!(
            dragger.on_pointer_up(&mut list, at(50.0)),
            Some(DragVisualMode::Rejected)
        );

        dragger.on_pointer_down(&list, at(10.0), &[]);
        dragger.on_pointer_move(&mut list, at(81.0));
        dragger.on_pointer_cancel();
        assert_eq!(dragger.on_pointer_up(&mut list, at(81.0)), None);
        assert!(dragger.controller().drops.is_empty());
    }

    #[test]
    fn edge_bands_scroll_at_pan_speed() {
        let mut list = list();
        let mut dragger = ListViewDragger::new(Recorder::default());
        dragger.on_pointer_down(&list, at(100.0), &[]);
        dragger.on_pointer_move(&mut list, at(197.0));
        assert_eq!(list.scroll_offset(), 20.0);
        assert_eq!(dragger.auto_scroll(&mut list), 20.0);
        assert_eq!(list.scroll_offset(), 40.0);

        dragger.on_pointer_move(&mut list, at(100.0));
        assert_eq!(dragger.auto_scroll(&mut list), 0.0);

        dragger.on_pointer_move(&mut list, at(2.0));
        assert_eq!(list.scroll_offset(), 20.0);
        dragger.on_pointer_move(&mut list, at(3.0));
        assert_eq!(list.scroll_offset(), 0.0);
        // Already at the top.
        assert_eq!(dragger.auto_scroll(&mut list), 0.0);
    }

    struct Host {
        list: FixedHeightVirtualizationController<CountingBinder>,
        dragger: ListViewDragger<Recorder>,
        timers: TimerEventScheduler<Self>,
    }

    fn timers(host: &mut Host) -> &mut TimerEventScheduler<Host> {
        &mut host.timers
    }

    fn parts(
        host: &mut Host,
    ) -> (
        &mut ListViewDragger<Recorder>,
        &mut FixedHeightVirtualizationController<CountingBinder>,
    ) {
        (&mut host.dragger, &mut host.list)
    }

    #[test]
    fn scheduled_auto_scroll_runs_while_the_pointer_rests() {
        let mut host = Host {
            list: list(),
            dragger: ListViewDragger::new(Recorder::default()),
            timers: TimerEventScheduler::new(),
        };
        assert!(!host.dragger.schedule_auto_scroll(&mut host.timers, parts));

        host.dragger.on_pointer_down(&host.list, at(100.0), &[]);
        host.dragger.on_pointer_move(&mut host.list, at(197.0));
        assert_eq!(host.list.scroll_offset(), 20.0);
        assert!(host.dragger.schedule_auto_scroll(&mut host.timers, parts));
        assert!(!host.dragger.schedule_auto_scroll(&mut host.timers, parts));
        assert!(host.dragger.is_auto_scroll_scheduled());

        // The pointer stays put; every step scrolls and retargets.
        for now in [0, 16, 32] {
            TimerEventScheduler::update_scheduled_events(&mut host, now, timers);
        }
        assert_eq!(host.list.scroll_offset(), 80.0);
        // 197 + 80 is in the bottom band of row 13.
        assert_eq!(
            host.dragger.drag_position().map(|p| p.insert_at_index),
            Some(14)
        );

        host.dragger.on_pointer_cancel();
        TimerEventScheduler::update_scheduled_events(&mut host, 48, timers);
        assert_eq!(host.list.scroll_offset(), 80.0);
        assert!(!host.dragger.is_auto_scroll_scheduled());
        assert!(host.timers.is_empty());
    }
}

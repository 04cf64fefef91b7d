// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The cooperative timer queue.

use core::fmt;

use thiserror::Error;

/// Handle to a scheduled item.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduledItemId(u64);

/// Timing information passed to a scheduled action.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TimerState {
    /// Time of the previous execution (or of scheduling, for the first one).
    pub start_ms: u64,
    /// Current time.
    pub now_ms: u64,
}

impl TimerState {
    /// Milliseconds elapsed since `start_ms`.
    pub fn delta_ms(&self) -> u64 {
        self.now_ms.saturating_sub(self.start_ms)
    }
}

/// Errors returned for scheduler misuse.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    /// The item is not (or no longer) known to the scheduler.
    #[error("cannot unschedule {0:?}: item is not scheduled")]
    NotScheduled(ScheduledItemId),
    /// The item was already unscheduled during the current update pass.
    #[error("cannot unschedule {0:?}: item was already unscheduled in this pass")]
    AlreadyUnscheduled(ScheduledItemId),
}

type Action<C> = Box<dyn FnMut(&mut C, TimerState)>;
type Condition<C> = Box<dyn FnMut(&mut C) -> bool>;

enum StopCondition<C> {
    Once,
    Never,
    Until(Option<Condition<C>>),
}

struct ScheduledItem<C> {
    id: ScheduledItemId,
    start_ms: u64,
    delay_ms: u64,
    interval_ms: u64,
    end_time_ms: Option<u64>,
    paused: bool,
    action: Option<Action<C>>,
    stop: StopCondition<C>,
}

impl<C> fmt::Debug for ScheduledItem<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledItem")
            .field("id", &self.id)
            .field("start_ms", &self.start_ms)
            .field("delay_ms", &self.delay_ms)
            .field("interval_ms", &self.interval_ms)
            .field("end_time_ms", &self.end_time_ms)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}

/// Cooperative round of timers driven once per frame by the host.
///
/// Actions receive the host context `C` mutably, so they may schedule or
/// unschedule other items (including themselves). While a pass is running the
/// scheduler is in *transaction mode*: structural changes are buffered and
/// applied once the pass completes, so the pass never observes its own list
/// changing under it.
pub struct TimerEventScheduler<C> {
    items: Vec<ScheduledItem<C>>,
    pending_schedule: Vec<ScheduledItem<C>>,
    pending_unschedule: Vec<ScheduledItemId>,
    transaction_mode: bool,
    next_id: u64,
    now_ms: u64,
}

impl<C> fmt::Debug for TimerEventScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEventScheduler")
            .field("items", &self.items)
            .field("pending_schedule", &self.pending_schedule)
            .field("pending_unschedule", &self.pending_unschedule)
            .field("transaction_mode", &self.transaction_mode)
            .field("next_id", &self.next_id)
            .field("now_ms", &self.now_ms)
            .finish()
    }
}

impl<C> Default for TimerEventScheduler<C> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pending_schedule: Vec::new(),
            pending_unschedule: Vec::new(),
            transaction_mode: false,
            next_id: 1,
            now_ms: 0,
        }
    }
}

impl<C> TimerEventScheduler<C> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// The time of the last update (or the last [`set_time`](Self::set_time)).
    ///
    /// New items are scheduled relative to this time.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Advance the scheduler clock without running anything.
    pub fn set_time(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    /// Number of scheduled items, including items buffered during a pass.
    pub fn len(&self) -> usize {
        self.items.len() + self.pending_schedule.len() - self.pending_unschedule.len()
    }

    /// Drop every item. Buffered changes of a running pass are dropped too.
    pub fn clear(&mut self) {
        if self.transaction_mode {
            let ids = self.items.iter().map(|i| i.id);
            for id in ids {
                if !self.pending_unschedule.contains(&id) {
                    self.pending_unschedule.push(id);
                }
            }
        } else {
            self.items.clear();
        }
        self.pending_schedule.clear();
    }

    /// Returns `true` if nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `action` once, `delay_ms` from now.
    pub fn schedule_once(
        &mut self,
        delay_ms: u64,
        action: impl FnMut(&mut C, TimerState) + 'static,
    ) -> ScheduledItemId {
        self.push(delay_ms, 0, None, StopCondition::Once, Box::new(action))
    }

    /// Run `action` every `interval_ms`, the first time `delay_ms` from now.
    pub fn schedule_every(
        &mut self,
        delay_ms: u64,
        interval_ms: u64,
        action: impl FnMut(&mut C, TimerState) + 'static,
    ) -> ScheduledItemId {
        self.push(
            delay_ms,
            interval_ms,
            None,
            StopCondition::Never,
            Box::new(action),
        )
    }

    /// Run `action` every `interval_ms` until `stop` returns `true` after an execution.
    pub fn schedule_until(
        &mut self,
        delay_ms: u64,
        interval_ms: u64,
        action: impl FnMut(&mut C, TimerState) + 'static,
        stop: impl FnMut(&mut C) -> bool + 'static,
    ) -> ScheduledItemId {
        self.push(
            delay_ms,
            interval_ms,
            None,
            StopCondition::Until(Some(Box::new(stop))),
            Box::new(action),
        )
    }

    /// Run `action` every `interval_ms` for `duration_ms` after the initial delay.
    pub fn schedule_for_duration(
        &mut self,
        delay_ms: u64,
        interval_ms: u64,
        duration_ms: u64,
        action: impl FnMut(&mut C, TimerState) + 'static,
    ) -> ScheduledItemId {
        let end = self.now_ms.saturating_add(delay_ms).saturating_add(duration_ms);
        self.push(
            delay_ms,
            interval_ms,
            Some(end),
            StopCondition::Never,
            Box::new(action),
        )
    }

    fn push(
        &mut self,
        delay_ms: u64,
        interval_ms: u64,
        end_time_ms: Option<u64>,
        stop: StopCondition<C>,
        action: Action<C>,
    ) -> ScheduledItemId {
        let id = ScheduledItemId(self.next_id);
        self.next_id += 1;
        let item = ScheduledItem {
            id,
            start_ms: self.now_ms,
            delay_ms,
            interval_ms,
            end_time_ms,
            paused: false,
            action: Some(action),
            stop,
        };
        tracing::trace!(?id, delay_ms, interval_ms, "schedule");
        if self.transaction_mode {
            self.pending_schedule.push(item);
        } else {
            self.items.push(item);
        }
        id
    }

    /// Returns `true` if the item is scheduled and not unscheduled in the current pass.
    pub fn is_scheduled(&self, id: ScheduledItemId) -> bool {
        !self.pending_unschedule.contains(&id)
            && (self.items.iter().any(|i| i.id == id)
                || self.pending_schedule.iter().any(|i| i.id == id))
    }

    /// Remove an item.
    ///
    /// During a pass the removal is buffered: the item will not run again, and
    /// disappears once the pass completes.
    pub fn unschedule(&mut self, id: ScheduledItemId) -> Result<(), TimerError> {
        if let Some(pos) = self.pending_schedule.iter().position(|i| i.id == id) {
            self.pending_schedule.remove(pos);
            return Ok(());
        }
        if self.pending_unschedule.contains(&id) {
            return Err(TimerError::AlreadyUnscheduled(id));
        }
        let Some(pos) = self.items.iter().position(|i| i.id == id) else {
            return Err(TimerError::NotScheduled(id));
        };
        tracing::trace!(?id, "unschedule");
        if self.transaction_mode {
            self.pending_unschedule.push(id);
        } else {
            self.items.remove(pos);
        }
        Ok(())
    }

    /// Stop running an item without removing it.
    pub fn pause(&mut self, id: ScheduledItemId) -> bool {
        self.set_paused(id, true)
    }

    /// Resume a paused item. Its delay restarts from the current time.
    pub fn resume(&mut self, id: ScheduledItemId) -> bool {
        let now = self.now_ms;
        let found = self.set_paused(id, false);
        if let Some(item) = self.item_mut(id) {
            item.start_ms = now;
        }
        found
    }

    fn set_paused(&mut self, id: ScheduledItemId, paused: bool) -> bool {
        match self.item_mut(id) {
            Some(item) => {
                item.paused = paused;
                true
            }
            None => false,
        }
    }

    fn item_mut(&mut self, id: ScheduledItemId) -> Option<&mut ScheduledItem<C>> {
        self.items
            .iter_mut()
            .chain(self.pending_schedule.iter_mut())
            .find(|i| i.id == id)
    }

    /// Run every due item once.
    ///
    /// `scheduler_of` locates this scheduler inside the host context, so actions
    /// receive the whole context (scheduler included) while the pass runs.
    /// An item is due when `now_ms >= start_ms + delay_ms`; after running, its
    /// start moves to `now_ms` and its delay becomes its interval.
    pub fn update_scheduled_events(ctx: &mut C, now_ms: u64, scheduler_of: fn(&mut C) -> &mut Self) {
        let count = {
            let s = scheduler_of(ctx);
            s.now_ms = now_ms;
            s.transaction_mode = true;
            s.items.len()
        };
        tracing::trace!(now_ms, count, "timer pass");

        for index in 0..count {
            let (state, mut action) = {
                let s = scheduler_of(ctx);
                let unscheduled = s.pending_unschedule.contains(&s.items[index].id);
                let item = &mut s.items[index];
                let due_ms = item.start_ms.saturating_add(item.delay_ms);
                if unscheduled || item.paused || now_ms < due_ms {
                    continue;
                }
                let state = TimerState {
                    start_ms: item.start_ms,
                    now_ms,
                };
                (state, item.action.take())
            };

            if let Some(action) = action.as_mut() {
                action(ctx, state);
            }

            let (id, mut condition) = {
                let s = scheduler_of(ctx);
                let item = &mut s.items[index];
                item.action = action;
                item.start_ms = now_ms;
                item.delay_ms = item.interval_ms;
                let condition = match &mut item.stop {
                    StopCondition::Until(c) => c.take(),
                    _ => None,
                };
                (item.id, condition)
            };

            let stop_requested = condition.as_mut().is_some_and(|c| c(ctx));

            let s = scheduler_of(ctx);
            let item = &mut s.items[index];
            if let StopCondition::Until(slot) = &mut item.stop {
                *slot = condition;
            }
            let should_unschedule = stop_requested
                || matches!(item.stop, StopCondition::Once)
                || item.end_time_ms.is_some_and(|end| now_ms > end);
            if should_unschedule && !s.pending_unschedule.contains(&id) {
                s.pending_unschedule.push(id);
            }
        }

        let s = scheduler_of(ctx);
        s.transaction_mode = false;
        let removed = core::mem::take(&mut s.pending_unschedule);
        s.items.retain(|i| !removed.contains(&i.id));
        let added = core::mem::take(&mut s.pending_schedule);
        s.items.extend(added);
    }
}

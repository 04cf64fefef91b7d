// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element-under-pointer tracking.
//!
//! Picks are recorded as *pending* while events are processed and turned into
//! hover transitions when committed. Several picks between two commits collapse
//! into a single transition from the last committed element to the last pending one.

use kurbo::Point;
use smallvec::SmallVec;
use trellis_tree::{ElementId, ElementPath, ElementTree};

use crate::pointer::MAX_POINTERS;

/// The hover change of one pointer, ready to be turned into events.
///
/// Events derived from it are sent in field order: `Out` to [`previous`](Self::previous),
/// `Leave` to each of [`leave`](Self::leave), `Enter` to each of [`enter`](Self::enter),
/// and `Over` to [`current`](Self::current).
#[derive(Clone, Debug, PartialEq)]
pub struct HoverTransition {
    /// The pointer.
    pub pointer_id: u32,
    /// Previously hovered element, if still alive.
    pub previous: Option<ElementId>,
    /// Elements the pointer left, innermost first.
    pub leave: ElementPath,
    /// Elements the pointer entered, outermost first.
    pub enter: ElementPath,
    /// Newly hovered element.
    pub current: Option<ElementId>,
    /// Pointer position of the pick that caused the change.
    pub position: Point,
}

#[derive(Copy, Clone, Debug, Default)]
struct Slot {
    pending: Option<ElementId>,
    committed: Option<ElementId>,
    position: Point,
    dirty: bool,
}

/// Pending and committed top element per pointer id.
#[derive(Clone, Debug)]
pub struct ElementUnderPointer {
    slots: [Slot; MAX_POINTERS as usize],
}

impl Default for ElementUnderPointer {
    fn default() -> Self {
        Self {
            slots: [Slot::default(); MAX_POINTERS as usize],
        }
    }
}

impl ElementUnderPointer {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pick for `pointer_id`.
    pub fn set_element_under_pointer(&mut self, pointer_id: u32, element: Option<ElementId>, position: Point) {
        let Some(slot) = self.slots.get_mut(pointer_id as usize) else {
            return;
        };
        slot.position = position;
        if slot.pending != element {
            slot.pending = element;
            slot.dirty = true;
        }
    }

    /// The most recent pick, committed or not.
    pub fn top_element_under_pointer(&self, pointer_id: u32) -> Option<ElementId> {
        self.slots.get(pointer_id as usize).and_then(|s| s.pending)
    }

    /// The element hover events were last sent for.
    pub fn committed(&self, pointer_id: u32) -> Option<ElementId> {
        self.slots.get(pointer_id as usize).and_then(|s| s.committed)
    }

    /// Whether a pick is waiting to be committed.
    pub fn has_pending_change(&self, pointer_id: u32) -> bool {
        self.slots.get(pointer_id as usize).is_some_and(|s| s.dirty)
    }

    /// Commit the pending pick of `pointer_id`.
    ///
    /// Returns `None` when the hovered element did not change. Elements that are
    /// no longer alive receive no leave notification.
    pub fn commit(&mut self, pointer_id: u32, tree: &ElementTree) -> Option<HoverTransition> {
        let slot = self.slots.get_mut(pointer_id as usize)?;
        if !slot.dirty {
            return None;
        }
        slot.dirty = false;
        let previous = slot.committed.filter(|&e| tree.is_alive(e));
        let current = slot.pending.filter(|&e| tree.is_alive(e));
        slot.committed = current;
        slot.pending = current;
        if previous == current {
            return None;
        }

        let old_path = previous.map(|e| tree.path_to(e)).unwrap_or_default();
        let new_path = current.map(|e| tree.path_to(e)).unwrap_or_default();
        let shared = old_path
            .iter()
            .zip(new_path.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let leave: ElementPath = old_path[shared..].iter().rev().copied().collect();
        let enter: ElementPath = SmallVec::from_slice(&new_path[shared..]);
        Some(HoverTransition {
            pointer_id,
            previous,
            leave,
            enter,
            current,
            position: slot.position,
        })
    }

    /// Commit every pointer with a pending change.
    pub fn commit_all(&mut self, tree: &ElementTree) -> Vec<HoverTransition> {
        (0..MAX_POINTERS)
            .filter_map(|id| self.commit(id, tree))
            .collect()
    }

    /// Forget `removed` elements, moving pointers that hovered one of them to `fallback`.
    ///
    /// `fallback` is usually the surviving parent of the removed subtree, which is
    /// still hovered, so no spurious enter is produced for it.
    pub fn retarget_removed(&mut self, removed: &[ElementId], fallback: Option<ElementId>) {
        for slot in &mut self.slots {
            if slot.committed.is_some_and(|e| removed.contains(&e)) {
                slot.committed = fallback;
            }
            if slot.pending.is_some_and(|e| removed.contains(&e)) {
                slot.pending = fallback;
                slot.dirty = slot.pending != slot.committed;
            }
        }
    }

    /// Reset a pointer, e.g. when it leaves the surface. The next commit leaves everything.
    pub fn clear_pointer(&mut self, pointer_id: u32) {
        if let Some(slot) = self.slots.get_mut(pointer_id as usize) {
            slot.dirty = slot.committed.is_some();
            slot.pending = None;
        }
    }
}

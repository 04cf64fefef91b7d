// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The element arena.

use kurbo::{Point, Rect};
use smallvec::SmallVec;

use crate::types::{ElementFlags, ElementId, ElementProps, PickingMode, PseudoStates};

/// A root→element path. Most UI trees are shallow, so short paths stay inline.
pub type ElementPath = SmallVec<[ElementId; 16]>;

#[derive(Clone, Debug)]
struct ElementData {
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    props: ElementProps,
    pseudo_states: PseudoStates,
    padding_rect: Rect,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    data: Option<ElementData>,
}

/// Arena of elements with strict single ownership: a parent owns its children,
/// children keep a non-owning back reference to their parent.
///
/// The tree does not lay anything out. The host (or an external layout engine)
/// writes resolved world-space rectangles with [`ElementTree::set_layout`].
#[derive(Clone, Debug, Default)]
pub struct ElementTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: Option<ElementId>,
}

impl ElementTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// The first element inserted without a parent.
    pub fn root(&self) -> Option<ElementId> {
        self.root.filter(|r| self.is_alive(*r))
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.data.is_some()).count()
    }

    /// Returns `true` if the tree has no live elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a new element as the last child of `parent` (or as a root).
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale: attaching to a destroyed element is a
    /// programming error.
    pub fn insert(&mut self, parent: Option<ElementId>, props: ElementProps) -> ElementId {
        if let Some(p) = parent {
            assert!(self.is_alive(p), "insert under stale parent {p:?}");
        }
        let data = ElementData {
            parent,
            children: Vec::new(),
            pseudo_states: PseudoStates::empty(),
            padding_rect: props.layout,
            props,
        };
        let id = if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.data = Some(data);
            ElementId::new(idx, slot.generation)
        } else {
            let idx = u32::try_from(self.slots.len()).expect("element arena exhausted");
            self.slots.push(Slot {
                generation: 1,
                data: Some(data),
            });
            ElementId::new(idx, 1)
        };
        match parent {
            Some(p) => {
                if let Some(pd) = self.data_mut(p) {
                    pd.children.push(id);
                }
            }
            None => {
                if self.root().is_none() {
                    self.root = Some(id);
                    if let Some(d) = self.data_mut(id) {
                        d.pseudo_states |= PseudoStates::ROOT;
                    }
                }
            }
        }
        id
    }

    /// Remove an element and its whole subtree.
    ///
    /// Returns the removed ids in preorder so callers can purge any side tables
    /// keyed by them. Removing a stale id returns an empty list.
    pub fn remove(&mut self, id: ElementId) -> Vec<ElementId> {
        if !self.is_alive(id) {
            return Vec::new();
        }
        let removed = self.descendants(id);
        if let Some(parent) = self.parent_of(id)
            && let Some(pd) = self.data_mut(parent)
        {
            pd.children.retain(|c| *c != id);
        }
        for &r in &removed {
            let slot = &mut self.slots[r.idx()];
            slot.data = None;
            self.free.push(r.0);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        removed
    }

    /// Returns `true` if `id` refers to a live element.
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.slots
            .get(id.idx())
            .is_some_and(|s| s.generation == id.1 && s.data.is_some())
    }

    fn data(&self, id: ElementId) -> Option<&ElementData> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.data.as_ref()
    }

    fn data_mut(&mut self, id: ElementId) -> Option<&mut ElementData> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.data.as_mut()
    }

    /// Parent of a live element.
    pub fn parent_of(&self, id: ElementId) -> Option<ElementId> {
        self.data(id)?.parent
    }

    /// Children of a live element, in child order. Empty for stale ids.
    pub fn children_of(&self, id: ElementId) -> &[ElementId] {
        self.data(id).map(|d| d.children.as_slice()).unwrap_or(&[])
    }

    /// Element properties.
    pub fn props(&self, id: ElementId) -> Option<&ElementProps> {
        self.data(id).map(|d| &d.props)
    }

    /// Debug name of an element.
    pub fn name(&self, id: ElementId) -> Option<&'static str> {
        self.data(id)?.props.name
    }

    /// Element flags.
    pub fn flags(&self, id: ElementId) -> Option<ElementFlags> {
        self.data(id).map(|d| d.props.flags)
    }

    /// Replace element flags. Returns `false` for stale ids.
    pub fn set_flags(&mut self, id: ElementId, flags: ElementFlags) -> bool {
        let Some(d) = self.data_mut(id) else {
            return false;
        };
        d.props.flags = flags;
        true
    }

    /// Sequential navigation index.
    pub fn tab_index(&self, id: ElementId) -> Option<i32> {
        self.data(id).map(|d| d.props.tab_index)
    }

    /// Set the sequential navigation index.
    pub fn set_tab_index(&mut self, id: ElementId, tab_index: i32) -> bool {
        let Some(d) = self.data_mut(id) else {
            return false;
        };
        d.props.tab_index = tab_index;
        true
    }

    /// World-space layout rectangle.
    pub fn layout(&self, id: ElementId) -> Option<Rect> {
        self.data(id).map(|d| d.props.layout)
    }

    /// Write a resolved layout rectangle.
    ///
    /// Returns the previous rectangle when it actually changed. Rectangles with
    /// NaN components are treated as "not ready yet" and ignored.
    pub fn set_layout(&mut self, id: ElementId, layout: Rect) -> Option<Rect> {
        if layout.x0.is_nan() || layout.y0.is_nan() || layout.x1.is_nan() || layout.y1.is_nan() {
            tracing::trace!(?id, "ignoring NaN layout");
            return None;
        }
        let d = self.data_mut(id)?;
        if d.props.layout == layout {
            return None;
        }
        let old = d.props.layout;
        d.props.layout = layout;
        Some(old)
    }

    /// Padding rectangle (content box), defaults to the layout rectangle.
    pub fn padding_rect(&self, id: ElementId) -> Option<Rect> {
        self.data(id).map(|d| d.padding_rect)
    }

    /// Write the padding rectangle.
    pub fn set_padding_rect(&mut self, id: ElementId, rect: Rect) -> bool {
        let Some(d) = self.data_mut(id) else {
            return false;
        };
        d.padding_rect = rect;
        true
    }

    /// Current pseudo states.
    pub fn pseudo_states(&self, id: ElementId) -> PseudoStates {
        self.data(id).map(|d| d.pseudo_states).unwrap_or_default()
    }

    /// Insert or remove pseudo states. Returns `true` if anything changed.
    pub fn set_pseudo_state(&mut self, id: ElementId, states: PseudoStates, on: bool) -> bool {
        let Some(d) = self.data_mut(id) else {
            return false;
        };
        let before = d.pseudo_states;
        d.pseudo_states.set(states, on);
        before != d.pseudo_states
    }

    /// Picking mode.
    pub fn picking_mode(&self, id: ElementId) -> Option<PickingMode> {
        self.data(id).map(|d| d.props.picking_mode)
    }

    /// Returns `true` if neither the element nor any ancestor is disabled.
    pub fn is_enabled_in_hierarchy(&self, id: ElementId) -> bool {
        self.ancestors_or_self(id).all(|a| {
            !self
                .flags(a)
                .is_some_and(|f| f.contains(ElementFlags::DISABLED))
        }) && self.is_alive(id)
    }

    /// Returns `true` if neither the element nor any ancestor is hidden.
    pub fn is_visible_in_hierarchy(&self, id: ElementId) -> bool {
        self.ancestors_or_self(id).all(|a| {
            !self
                .flags(a)
                .is_some_and(|f| f.contains(ElementFlags::HIDDEN))
        }) && self.is_alive(id)
    }

    /// Returns `true` if the element can take keyboard focus right now:
    /// it is focusable, enabled and visible in hierarchy.
    pub fn can_grab_focus(&self, id: ElementId) -> bool {
        self.flags(id)
            .is_some_and(|f| f.contains(ElementFlags::FOCUSABLE))
            && self.is_enabled_in_hierarchy(id)
            && self.is_visible_in_hierarchy(id)
    }

    /// Iterate from `id` up to the root, `id` included.
    pub fn ancestors_or_self(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let start = self.is_alive(id).then_some(id);
        core::iter::successors(start, move |&n| self.parent_of(n))
    }

    /// Number of ancestors of `id` (the root has depth 0).
    pub fn depth(&self, id: ElementId) -> usize {
        self.ancestors_or_self(id).count().saturating_sub(1)
    }

    /// Root→element path, empty for stale ids.
    pub fn path_to(&self, id: ElementId) -> ElementPath {
        let mut path: ElementPath = self.ancestors_or_self(id).collect();
        path.reverse();
        path
    }

    /// Returns `true` if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: ElementId, id: ElementId) -> bool {
        self.ancestors_or_self(id).any(|a| a == ancestor)
    }

    /// Lowest common ancestor of two live elements (an element is its own ancestor).
    pub fn common_ancestor(&self, a: ElementId, b: ElementId) -> Option<ElementId> {
        let pa = self.path_to(a);
        let pb = self.path_to(b);
        pa.iter()
            .zip(pb.iter())
            .take_while(|(x, y)| x == y)
            .last()
            .map(|(x, _)| *x)
    }

    /// Preorder list of `id` and all of its descendants.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        if !self.is_alive(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            // Reverse so the stack yields children left to right.
            for &c in self.children_of(n).iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    /// Move an element to the end of its parent's child list (drawn last, picked first).
    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        self.reorder_in_parent(id, true)
    }

    /// Move an element to the start of its parent's child list.
    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        self.reorder_in_parent(id, false)
    }

    fn reorder_in_parent(&mut self, id: ElementId, to_front: bool) -> bool {
        let Some(parent) = self.parent_of(id) else {
            return false;
        };
        let Some(pd) = self.data_mut(parent) else {
            return false;
        };
        pd.children.retain(|c| *c != id);
        if to_front {
            pd.children.push(id);
        } else {
            pd.children.insert(0, id);
        }
        true
    }

    /// Topmost pickable element under a world-space point.
    ///
    /// Children are tested last-to-first so later siblings win, then the
    /// element itself if its picking mode is [`PickingMode::Position`].
    pub fn pick(&self, point: Point) -> Option<ElementId> {
        self.root().and_then(|r| self.pick_from(r, point))
    }

    /// Like [`ElementTree::pick`] but restricted to the subtree rooted at `from`.
    pub fn pick_from(&self, from: ElementId, point: Point) -> Option<ElementId> {
        let d = self.data(from)?;
        if d.props.flags.contains(ElementFlags::HIDDEN) {
            return None;
        }
        for &c in d.children.iter().rev() {
            if let Some(hit) = self.pick_from(c, point) {
                return Some(hit);
            }
        }
        (d.props.picking_mode == PickingMode::Position && d.props.layout.contains(point))
            .then_some(from)
    }
}

// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The committed focus chain and pending focus bookkeeping.

use trellis_tree::{ElementFlags, ElementId, ElementTree};

/// One link of the focus chain.
///
/// Composite roots hide their internals: from outside a composite, the
/// composite itself is the focused element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FocusedElement {
    /// Root of the scope this link describes: a composite root, or the tree root.
    pub subtree_root: ElementId,
    /// The element focused as seen from inside `subtree_root`.
    pub focused: ElementId,
}

/// Focus state of one panel.
///
/// A focus change is announced first (the focus controller dispatches its
/// blur/focus events and calls [`begin_pending`](Self::begin_pending) for each)
/// and committed later, when those events are processed
/// ([`process_pending_focus_change`](Self::process_pending_focus_change)).
/// While changes are pending, [`leaf_focused_element`](Self::leaf_focused_element)
/// reports the most recent pending target so that nested focus changes start
/// from the right element.
#[derive(Clone, Debug, Default)]
pub struct FocusedElementChain {
    /// Innermost link first.
    chain: Vec<FocusedElement>,
    pending_count: u32,
    last_pending: Option<ElementId>,
}

impl FocusedElementChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed links, innermost first.
    pub fn links(&self) -> &[FocusedElement] {
        &self.chain
    }

    /// Number of announced focus changes not yet committed.
    pub fn pending_count(&self) -> u32 {
        self.pending_count
    }

    /// The element that really holds focus, taking pending changes into account.
    pub fn leaf_focused_element(&self) -> Option<ElementId> {
        if self.pending_count > 0 {
            self.last_pending
        } else {
            self.chain.first().map(|l| l.focused)
        }
    }

    /// The committed focused element as seen from the top of the tree.
    pub fn focused_element(&self) -> Option<ElementId> {
        self.chain.last().map(|l| l.focused)
    }

    /// The committed focused element as seen by `relative_to`.
    ///
    /// An element inside a composite sees the element focused within that
    /// composite; `None` sees the top-level view.
    pub fn retargeted_focused_element(
        &self,
        tree: &ElementTree,
        relative_to: Option<ElementId>,
    ) -> Option<ElementId> {
        let Some(scope) = relative_to.and_then(|r| tree.parent_of(r)) else {
            return self.focused_element();
        };
        let scope_root = tree
            .ancestors_or_self(scope)
            .find(|&a| is_scope_root(tree, a))?;
        self.chain
            .iter()
            .find(|l| l.subtree_root == scope_root)
            .map(|l| l.focused)
    }

    /// Whether `id` is the committed leaf focused element.
    pub fn is_focused(&self, id: ElementId) -> bool {
        self.chain.first().is_some_and(|l| l.focused == id)
    }

    /// Announce a focus change towards `target`.
    pub fn begin_pending(&mut self, target: Option<ElementId>) {
        self.pending_count += 1;
        self.last_pending = target;
    }

    /// Commit a focus change to `target` (`None` clears focus).
    ///
    /// Rebuilds the chain with one link per composite root between `target`
    /// and the tree root; each outer link sees the composite it contains as
    /// the focused element.
    pub fn process_pending_focus_change(&mut self, tree: &ElementTree, target: Option<ElementId>) {
        self.pending_count = self.pending_count.saturating_sub(1);
        if self.pending_count == 0 {
            self.last_pending = None;
        }
        self.chain.clear();
        let Some(target) = target.filter(|&t| tree.is_alive(t)) else {
            tracing::debug!("focus cleared");
            return;
        };
        let mut retargeted = target;
        for id in tree.ancestors_or_self(target) {
            if is_scope_root(tree, id) {
                self.chain.push(FocusedElement {
                    subtree_root: id,
                    focused: retargeted,
                });
                retargeted = id;
            }
        }
        tracing::debug!(?target, depth = self.chain.len(), "focus committed");
    }

    /// Drop every link that mentions a removed element.
    ///
    /// A removed pending target reads as no focus. The pending count is left
    /// alone: the announced events still arrive, and committing a removed
    /// target clears focus and settles the count.
    ///
    /// Returns whether focus was lost.
    pub fn purge(&mut self, tree: &ElementTree) -> bool {
        if self.last_pending.is_some_and(|p| !tree.is_alive(p)) {
            self.last_pending = None;
        }
        let stale = self
            .chain
            .iter()
            .any(|l| !tree.is_alive(l.subtree_root) || !tree.is_alive(l.focused));
        if stale {
            self.chain.clear();
        }
        stale
    }
}

fn is_scope_root(tree: &ElementTree, id: ElementId) -> bool {
    tree.parent_of(id).is_none()
        || tree
            .flags(id)
            .is_some_and(|f| f.contains(ElementFlags::COMPOSITE_ROOT))
}

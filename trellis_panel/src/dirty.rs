// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered, deduplicated element sets drained by the host.

use hashbrown::HashSet;
use trellis_tree::{ElementId, ElementTree};

/// Elements marked since the last drain, in first-mark order.
#[derive(Clone, Debug, Default)]
pub(crate) struct DirtyElements {
    set: HashSet<ElementId>,
    order: Vec<ElementId>,
}

impl DirtyElements {
    /// Mark `id`. Returns `false` if it was already marked.
    pub(crate) fn mark(&mut self, id: ElementId) -> bool {
        if !self.set.insert(id) {
            return false;
        }
        self.order.push(id);
        true
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Take every marked element that is still alive.
    pub(crate) fn drain_alive(&mut self, tree: &ElementTree) -> Vec<ElementId> {
        self.set.clear();
        let mut out = core::mem::take(&mut self.order);
        out.retain(|&id| tree.is_alive(id));
        out
    }

    pub(crate) fn forget(&mut self, removed: &[ElementId]) {
        let before = self.set.len();
        for id in removed {
            self.set.remove(id);
        }
        if self.set.len() != before {
            self.order.retain(|id| self.set.contains(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use trellis_tree::ElementProps;

    #[test]
    fn marks_are_deduplicated_and_ordered() {
        let mut tree = ElementTree::new();
        let root = tree.insert(None, ElementProps::at(Rect::ZERO));
        let a = tree.insert(Some(root), ElementProps::at(Rect::ZERO));
        let b = tree.insert(Some(root), ElementProps::at(Rect::ZERO));

        let mut dirty = DirtyElements::default();
        assert!(dirty.mark(b));
        assert!(dirty.mark(a));
        assert!(!dirty.mark(b));

        tree.remove(a);
        assert_eq!(dirty.drain_alive(&tree), [b]);
        assert!(dirty.is_empty());
        assert!(dirty.mark(b));
    }

    #[test]
    fn forget_drops_removed_ids() {
        let mut tree = ElementTree::new();
        let root = tree.insert(None, ElementProps::at(Rect::ZERO));
        let a = tree.insert(Some(root), ElementProps::at(Rect::ZERO));
        let mut dirty = DirtyElements::default();
        dirty.mark(root);
        dirty.mark(a);
        dirty.forget(&[a]);
        assert_eq!(dirty.drain_alive(&tree), [root]);
    }
}

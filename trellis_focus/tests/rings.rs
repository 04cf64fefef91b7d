// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Focus rings driven by events, committed through a chain.

use kurbo::{Point, Rect};
use trellis_event::{
    Event, EventKind, EventPayload, EventPool, Key, KeyData, Modifiers, NavigationData,
    NavigationDirection,
};
use trellis_focus::{
    FocusChangeDirection, FocusRing, FocusedElementChain, NavigateFocusRing, TabOrderFocusRing,
    focusable_parent_for_pointer,
};
use trellis_tree::{ElementFlags, ElementId, ElementProps, ElementTree};

fn row(tree: &mut ElementTree, parent: ElementId, n: u8) -> Vec<ElementId> {
    (0..n)
        .map(|i| {
            let x = f64::from(i) * 30.0;
            tree.insert(
                Some(parent),
                ElementProps::focusable(Rect::new(x, 0.0, x + 20.0, 20.0)),
            )
        })
        .collect()
}

#[test]
fn tab_and_shift_tab_walk_the_ring() {
    let mut tree = ElementTree::new();
    let root = tree.insert(None, ElementProps::at(Rect::new(0.0, 0.0, 200.0, 50.0)));
    let items = row(&mut tree, root, 3);
    let mut pool = EventPool::default();
    let mut ring = TabOrderFocusRing::default();
    let mut chain = FocusedElementChain::new();

    let tab = pool.acquire(
        EventKind::KeyDown,
        EventPayload::Key(KeyData {
            key: Key::Tab,
            modifiers: Modifiers::empty(),
        }),
        0,
    );
    let shift_tab = pool.acquire(
        EventKind::KeyDown,
        EventPayload::Key(KeyData {
            key: Key::Tab,
            modifiers: Modifiers::SHIFT,
        }),
        0,
    );

    let mut step = |event: &Event, chain: &mut FocusedElementChain| {
        let current = chain.leaf_focused_element();
        let direction = ring.focus_change_direction(&tree, current, event);
        let next = ring.next_focusable(&tree, current, direction);
        chain.begin_pending(next);
        chain.process_pending_focus_change(&tree, next);
        next
    };

    assert_eq!(step(&tab, &mut chain), Some(items[0]));
    assert_eq!(step(&tab, &mut chain), Some(items[1]));
    assert_eq!(step(&shift_tab, &mut chain), Some(items[0]));
    assert_eq!(step(&shift_tab, &mut chain), Some(items[2]));
    assert!(chain.is_focused(items[2]));
}

#[test]
fn arrow_navigation_ignores_other_keys() {
    let mut tree = ElementTree::new();
    let root = tree.insert(None, ElementProps::at(Rect::new(0.0, 0.0, 200.0, 50.0)));
    let items = row(&mut tree, root, 3);
    let mut pool = EventPool::default();
    let ring = NavigateFocusRing::default();

    let right = pool.acquire(
        EventKind::NavigationMove,
        EventPayload::Navigation(NavigationData {
            direction: NavigationDirection::Right,
            modifiers: Modifiers::empty(),
        }),
        0,
    );
    let enter = pool.acquire(
        EventKind::KeyDown,
        EventPayload::Key(KeyData {
            key: Key::Enter,
            modifiers: Modifiers::empty(),
        }),
        0,
    );
    assert_eq!(
        ring.focus_change_direction(&tree, Some(items[0]), &right),
        FocusChangeDirection::Right
    );
    assert_eq!(
        ring.focus_change_direction(&tree, Some(items[0]), &enter),
        FocusChangeDirection::None
    );
}

#[test]
fn disabled_and_excluded_elements_are_skipped() {
    let mut tree = ElementTree::new();
    let root = tree.insert(None, ElementProps::at(Rect::new(0.0, 0.0, 200.0, 50.0)));
    let items = row(&mut tree, root, 4);
    tree.set_flags(items[1], ElementFlags::FOCUSABLE | ElementFlags::DISABLED);
    tree.set_flags(
        items[2],
        ElementFlags::FOCUSABLE | ElementFlags::EXCLUDED_FROM_FOCUS_RING,
    );

    let mut tab = TabOrderFocusRing::default();
    assert_eq!(tab.ring(&tree), &[items[0], items[3]]);

    let mut nav = NavigateFocusRing::default();
    assert_eq!(
        nav.next_focusable(&tree, Some(items[0]), FocusChangeDirection::Right),
        Some(items[3])
    );
}

#[test]
fn pointer_focus_walks_up_to_a_focusable_ancestor() {
    let mut tree = ElementTree::new();
    let root = tree.insert(None, ElementProps::at(Rect::new(0.0, 0.0, 200.0, 50.0)));
    let button = tree.insert(Some(root), ElementProps::focusable(Rect::new(0.0, 0.0, 50.0, 20.0)));
    let label = tree.insert(Some(button), ElementProps::at(Rect::new(5.0, 5.0, 45.0, 15.0)));

    let hit = tree.pick(Point::new(10.0, 10.0));
    assert_eq!(hit, Some(label));
    assert_eq!(focusable_parent_for_pointer(&tree, label), Some(button));
    assert_eq!(focusable_parent_for_pointer(&tree, root), None);
}

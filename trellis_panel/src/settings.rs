// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Panel configuration.

use trellis_event::click::ClickSettings;
use trellis_focus::DefaultFocusOrder;

/// Which focus ring a panel navigates with.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FocusRingKind {
    /// Sequential order by tab index only.
    #[default]
    TabOrder,
    /// Spatial navigation for directional moves, tab order for sequential ones.
    Navigate,
}

/// Settings a [`Panel`](crate::Panel) is created with.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PanelSettings {
    /// Click and multi-click recognition.
    pub click: ClickSettings,
    /// Focus ring used for keyboard and navigation moves.
    pub focus_ring: FocusRingKind,
    /// Tie-break order for elements sharing a tab index.
    pub default_focus_order: DefaultFocusOrder,
    /// Send `Mouse*` events alongside events of the primary mouse pointer.
    pub compatibility_mouse_events: bool,
    /// Number of events the pool preallocates.
    pub event_pool_capacity: usize,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            click: ClickSettings::default(),
            focus_ring: FocusRingKind::default(),
            default_focus_order: DefaultFocusOrder::default(),
            compatibility_mouse_events: true,
            event_pool_capacity: 64,
        }
    }
}

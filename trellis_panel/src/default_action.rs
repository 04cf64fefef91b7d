// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element default actions.

use trellis_event::{Event, FrameAbort};

use crate::Panel;

/// Built-in behavior of an element, run after its callbacks.
///
/// An element has at most one handler, installed with
/// [`Panel::set_default_action_handler`]. The at-target variants run right
/// after the target's callbacks, the others once bubbling is over. Nothing runs
/// if a callback prevented the default. When the event skips disabled elements
/// and the target is disabled, the `*_disabled` variants run instead.
///
/// Every method defaults to doing nothing.
pub trait DefaultActionHandler<S> {
    /// Runs after the target phase.
    fn execute_default_action_at_target(
        &self,
        event: &mut Event,
        panel: &mut Panel<S>,
    ) -> Result<(), FrameAbort> {
        let _ = (event, panel);
        Ok(())
    }

    /// Runs after the bubble-up phase.
    fn execute_default_action(&self, event: &mut Event, panel: &mut Panel<S>) -> Result<(), FrameAbort> {
        let _ = (event, panel);
        Ok(())
    }

    /// [`execute_default_action_at_target`](Self::execute_default_action_at_target)
    /// for a disabled target.
    fn execute_default_action_disabled_at_target(
        &self,
        event: &mut Event,
        panel: &mut Panel<S>,
    ) -> Result<(), FrameAbort> {
        let _ = (event, panel);
        Ok(())
    }

    /// [`execute_default_action`](Self::execute_default_action) for a disabled target.
    fn execute_default_action_disabled(
        &self,
        event: &mut Event,
        panel: &mut Panel<S>,
    ) -> Result<(), FrameAbort> {
        let _ = (event, panel);
        Ok(())
    }
}

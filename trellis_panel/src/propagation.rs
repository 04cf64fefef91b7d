// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event processing: propagation phases, callbacks, and default actions.

use trellis_event::{Event, EventKind, FrameAbort, PropagationPhase};
use trellis_tree::ElementId;

use crate::Panel;

impl<S> Panel<S> {
    /// Process one event: bookkeeping, target resolution, propagation, focus
    /// reaction, and the events derived from it.
    pub(crate) fn process(&mut self, event: &mut Event) -> Result<(), FrameAbort> {
        self.pre_dispatch(event)?;
        let Some(target) = self.resolve_target(event) else {
            return self.post_dispatch(event);
        };
        if event.kind() == EventKind::PointerDown {
            self.stamp_click_count(event, target);
        }
        self.propagate(event, target)?;
        self.apply_focus_navigation(event)?;
        self.post_dispatch(event)
    }

    /// Send `event` through the root→`target` path.
    ///
    /// Trickle-down and bubble-up visit the ancestors of `target`; the target
    /// itself is visited once, at target. Default actions run at target and
    /// after bubbling unless the default was prevented.
    pub(crate) fn propagate(&mut self, event: &mut Event, target: ElementId) -> Result<(), FrameAbort> {
        let path = self.tree.path_to(target);
        let Some((_, ancestors)) = path.split_last() else {
            return Ok(());
        };
        event.set_target(Some(target));
        event.set_path(&path);

        if event.trickles_down() {
            event.set_phase(PropagationPhase::TrickleDown);
            for &element in ancestors {
                if event.is_propagation_stopped() {
                    break;
                }
                self.invoke_callbacks(element, event)?;
            }
        }

        if !event.is_propagation_stopped() {
            event.set_phase(PropagationPhase::AtTarget);
            self.invoke_callbacks(target, event)?;
        }

        event.set_phase(PropagationPhase::DefaultActionAtTarget);
        self.run_default_action(target, event)?;

        if event.bubbles() {
            event.set_phase(PropagationPhase::BubbleUp);
            for &element in ancestors.iter().rev() {
                if event.is_propagation_stopped() {
                    break;
                }
                self.invoke_callbacks(element, event)?;
            }
        }

        event.set_phase(PropagationPhase::DefaultAction);
        self.run_default_action(target, event)?;

        event.set_phase(PropagationPhase::None);
        event.set_current_target(None);
        Ok(())
    }

    fn invoke_callbacks(&mut self, element: ElementId, event: &mut Event) -> Result<(), FrameAbort> {
        let type_id = event.type_id();
        let phase = event.phase();
        let list = match self.callbacks.get_mut(&element) {
            Some(registry) if registry.has_callbacks(type_id, phase) => registry.begin_invoke(),
            _ => return Ok(()),
        };
        let enabled = !event.skips_disabled_elements() || self.tree.is_enabled_in_hierarchy(element);
        event.set_current_target(Some(element));

        let mut result = Ok(());
        for entry in list.iter() {
            if event.is_immediate_propagation_stopped() {
                break;
            }
            if !entry.applies(type_id, phase, enabled) {
                continue;
            }
            if let Err(abort) = (entry.callback)(event, self) {
                result = Err(abort);
                break;
            }
        }
        // The element may have been removed by one of its callbacks.
        if let Some(registry) = self.callbacks.get_mut(&element) {
            registry.end_invoke();
        }
        result
    }

    fn run_default_action(&mut self, target: ElementId, event: &mut Event) -> Result<(), FrameAbort> {
        if event.is_default_prevented() {
            return Ok(());
        }
        let Some(handler) = self.default_actions.get(&target).cloned() else {
            return Ok(());
        };
        let disabled = event.skips_disabled_elements() && !self.tree.is_enabled_in_hierarchy(target);
        event.set_current_target(Some(target));
        match (event.phase(), disabled) {
            (PropagationPhase::DefaultActionAtTarget, false) => {
                handler.execute_default_action_at_target(event, self)
            }
            (PropagationPhase::DefaultActionAtTarget, true) => {
                handler.execute_default_action_disabled_at_target(event, self)
            }
            (_, false) => handler.execute_default_action(event, self),
            (_, true) => handler.execute_default_action_disabled(event, self),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use kurbo::Rect;
    use trellis_event::{CallbackPhase, EventPayload, InvokePolicy, PropagationPhase};
    use trellis_tree::{ElementFlags, ElementProps};

    use super::*;
    use crate::{DefaultActionHandler, PanelSettings};

    type Log = Rc<RefCell<Vec<(&'static str, PropagationPhase)>>>;

    fn logger(log: &Log, tag: &'static str) -> Rc<crate::PanelCallback<()>> {
        let log = log.clone();
        Rc::new(move |e: &mut Event, _: &mut Panel<()>| -> Result<(), FrameAbort> {
            log.borrow_mut().push((tag, e.phase()));
            Ok(())
        })
    }

    fn chain() -> (Panel<()>, ElementId, ElementId, ElementId) {
        let mut panel = Panel::new((), PanelSettings::default());
        let root = panel.insert(None, ElementProps::at(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let mid = panel.insert(Some(root), ElementProps::at(Rect::new(0.0, 0.0, 50.0, 50.0)));
        let leaf = panel.insert(Some(mid), ElementProps::at(Rect::new(0.0, 0.0, 10.0, 10.0)));
        (panel, root, mid, leaf)
    }

    #[test]
    fn phases_run_in_order() {
        let (mut panel, root, mid, leaf) = chain();
        let log: Log = Rc::default();
        let kind = EventKind::Custom(1);
        for (el, tag) in [(root, "root"), (mid, "mid"), (leaf, "leaf")] {
            let trickle = logger(&log, tag);
            let bubble = logger(&log, tag);
            panel.register_callback(el, kind, CallbackPhase::TrickleDownAndTarget, InvokePolicy::Default, trickle);
            panel.register_callback(el, kind, CallbackPhase::TargetAndBubbleUp, InvokePolicy::Default, bubble);
        }
        panel.send_event(kind, EventPayload::None, Some(leaf)).unwrap();

        use PropagationPhase::{AtTarget, BubbleUp, TrickleDown};
        assert_eq!(
            *log.borrow(),
            [
                ("root", TrickleDown),
                ("mid", TrickleDown),
                ("leaf", AtTarget),
                ("leaf", AtTarget),
                ("mid", BubbleUp),
                ("root", BubbleUp),
            ]
        );
    }

    #[test]
    fn stop_propagation_finishes_the_current_element() {
        let (mut panel, root, mid, leaf) = chain();
        let log: Log = Rc::default();
        let kind = EventKind::Custom(2);
        panel.on(mid, kind, |e, _| {
            e.stop_propagation();
            Ok(())
        });
        panel.register_callback(mid, kind, CallbackPhase::TargetAndBubbleUp, InvokePolicy::Default, logger(&log, "mid"));
        panel.register_callback(root, kind, CallbackPhase::TargetAndBubbleUp, InvokePolicy::Default, logger(&log, "root"));
        panel.send_event(kind, EventPayload::None, Some(leaf)).unwrap();
        assert_eq!(*log.borrow(), [("mid", PropagationPhase::BubbleUp)]);
    }

    #[test]
    fn immediate_stop_skips_remaining_callbacks() {
        let (mut panel, _, mid, leaf) = chain();
        let log: Log = Rc::default();
        let kind = EventKind::Custom(3);
        panel.on(mid, kind, |e, _| {
            e.stop_immediate_propagation();
            Ok(())
        });
        panel.register_callback(mid, kind, CallbackPhase::TargetAndBubbleUp, InvokePolicy::Default, logger(&log, "mid"));
        panel.send_event(kind, EventPayload::None, Some(leaf)).unwrap();
        assert!(log.borrow().is_empty());
    }

    struct Recorder(Log);

    impl DefaultActionHandler<()> for Recorder {
        fn execute_default_action_at_target(&self, e: &mut Event, _: &mut Panel<()>) -> Result<(), FrameAbort> {
            self.0.borrow_mut().push(("at_target", e.phase()));
            Ok(())
        }

        fn execute_default_action(&self, e: &mut Event, _: &mut Panel<()>) -> Result<(), FrameAbort> {
            self.0.borrow_mut().push(("default", e.phase()));
            Ok(())
        }

        fn execute_default_action_disabled(&self, e: &mut Event, _: &mut Panel<()>) -> Result<(), FrameAbort> {
            self.0.borrow_mut().push(("disabled", e.phase()));
            Ok(())
        }
    }

    #[test]
    fn default_actions_respect_prevent_default_and_disabled() {
        let (mut panel, _, mid, leaf) = chain();
        let log: Log = Rc::default();
        panel.set_default_action_handler(leaf, Rc::new(Recorder(log.clone())));

        panel.send_event(EventKind::Custom(4), EventPayload::None, Some(leaf)).unwrap();
        assert_eq!(
            *log.borrow(),
            [
                ("at_target", PropagationPhase::DefaultActionAtTarget),
                ("default", PropagationPhase::DefaultAction),
            ]
        );

        log.borrow_mut().clear();
        panel.on(mid, EventKind::Custom(5), |e, _| {
            e.prevent_default();
            Ok(())
        });
        panel.send_event(EventKind::Custom(5), EventPayload::None, Some(leaf)).unwrap();
        // Prevented while bubbling: only the at-target action ran.
        assert_eq!(
            *log.borrow(),
            [("at_target", PropagationPhase::DefaultActionAtTarget)]
        );

        log.borrow_mut().clear();
        panel.set_flags(mid, ElementFlags::DISABLED);
        panel.send_event(EventKind::ValidateCommand, EventPayload::None, Some(leaf)).unwrap();
        assert_eq!(*log.borrow(), [("disabled", PropagationPhase::DefaultAction)]);
    }

    #[test]
    fn disabled_elements_only_run_include_disabled_callbacks() {
        let (mut panel, _, mid, leaf) = chain();
        let log: Log = Rc::default();
        panel.set_flags(leaf, ElementFlags::DISABLED);
        panel.register_callback(leaf, EventKind::KeyDown, CallbackPhase::TargetAndBubbleUp, InvokePolicy::Default, logger(&log, "default"));
        panel.register_callback(leaf, EventKind::KeyDown, CallbackPhase::TargetAndBubbleUp, InvokePolicy::IncludeDisabled, logger(&log, "include"));
        panel.register_callback(mid, EventKind::KeyDown, CallbackPhase::TargetAndBubbleUp, InvokePolicy::Default, logger(&log, "mid"));
        panel.send_event(EventKind::KeyDown, EventPayload::None, Some(leaf)).unwrap();
        assert_eq!(
            *log.borrow(),
            [("include", PropagationPhase::AtTarget), ("mid", PropagationPhase::BubbleUp)]
        );
    }
}

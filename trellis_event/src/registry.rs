// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element callback registry with copy-on-write under re-entrant invocation.
//!
//! The registry is generic over the callback type `F` (usually a `dyn Fn(..)`),
//! and only stores and filters callbacks; invoking them is up to the owner.
//! An invocation brackets its iteration with [`EventCallbackRegistry::begin_invoke`]
//! and [`EventCallbackRegistry::end_invoke`]. While at least one invocation is in
//! progress, [`register`](EventCallbackRegistry::register) and
//! [`unregister`](EventCallbackRegistry::unregister) write to a shadow list that is
//! swapped in when the outermost invocation ends. A running invocation therefore
//! never sees the list change.

use std::fmt;
use std::rc::Rc;

use crate::event::{EventTypeId, PropagationPhase};

/// Which propagation phases a callback is registered for.
///
/// Both variants also run at the target.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CallbackPhase {
    /// Runs while trickling down and at the target.
    TrickleDownAndTarget,
    /// Runs at the target and while bubbling up.
    #[default]
    TargetAndBubbleUp,
}

impl CallbackPhase {
    /// Whether callbacks of this phase run during `phase`.
    pub fn runs_in(self, phase: PropagationPhase) -> bool {
        match phase {
            PropagationPhase::AtTarget => true,
            PropagationPhase::TrickleDown => self == Self::TrickleDownAndTarget,
            PropagationPhase::BubbleUp => self == Self::TargetAndBubbleUp,
            _ => false,
        }
    }
}

/// Whether a callback runs on disabled elements.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum InvokePolicy {
    /// Skipped when the element is disabled and the event skips disabled elements.
    #[default]
    Default,
    /// Always runs.
    IncludeDisabled,
}

/// One registration.
pub struct CallbackEntry<F: ?Sized> {
    /// Event type the callback listens to.
    pub type_id: EventTypeId,
    /// Phases the callback runs in.
    pub phase: CallbackPhase,
    /// Disabled-element policy.
    pub policy: InvokePolicy,
    /// The callback.
    pub callback: Rc<F>,
}

impl<F: ?Sized> Clone for CallbackEntry<F> {
    fn clone(&self) -> Self {
        Self {
            type_id: self.type_id,
            phase: self.phase,
            policy: self.policy,
            callback: self.callback.clone(),
        }
    }
}

impl<F: ?Sized> fmt::Debug for CallbackEntry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackEntry")
            .field("type_id", &self.type_id)
            .field("phase", &self.phase)
            .field("policy", &self.policy)
            .field("callback", &Rc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}

impl<F: ?Sized> CallbackEntry<F> {
    /// Whether this entry should run for an event of `type_id` in `phase`.
    ///
    /// `element_enabled` is `false` when the element is disabled and the event skips
    /// disabled elements.
    pub fn applies(&self, type_id: EventTypeId, phase: PropagationPhase, element_enabled: bool) -> bool {
        self.type_id == type_id
            && self.phase.runs_in(phase)
            && (element_enabled || self.policy == InvokePolicy::IncludeDisabled)
    }

    fn same(&self, type_id: EventTypeId, phase: CallbackPhase, callback: &Rc<F>) -> bool {
        self.type_id == type_id && self.phase == phase && same_callback(&self.callback, callback)
    }
}

fn same_callback<F: ?Sized>(a: &Rc<F>, b: &Rc<F>) -> bool {
    Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
}

/// Snapshot of a registry's entries taken by [`EventCallbackRegistry::begin_invoke`].
pub type CallbackList<F> = Rc<Vec<CallbackEntry<F>>>;

enum InvokeState<F: ?Sized> {
    Idle,
    Invoking { depth: u32 },
    PendingSwap { depth: u32, shadow: Vec<CallbackEntry<F>> },
}

impl<F: ?Sized> fmt::Debug for InvokeState<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Invoking { depth } => f.debug_struct("Invoking").field("depth", depth).finish(),
            Self::PendingSwap { depth, shadow } => f
                .debug_struct("PendingSwap")
                .field("depth", depth)
                .field("shadow_len", &shadow.len())
                .finish(),
        }
    }
}

/// Phase-tagged callbacks of one element.
pub struct EventCallbackRegistry<F: ?Sized> {
    primary: CallbackList<F>,
    state: InvokeState<F>,
}

impl<F: ?Sized> fmt::Debug for EventCallbackRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCallbackRegistry")
            .field("primary", &self.primary)
            .field("state", &self.state)
            .finish()
    }
}

impl<F: ?Sized> Default for EventCallbackRegistry<F> {
    fn default() -> Self {
        Self {
            primary: Rc::new(Vec::new()),
            state: InvokeState::Idle,
        }
    }
}

impl<F: ?Sized> EventCallbackRegistry<F> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The list writes currently go to.
    fn write_list(&mut self) -> &mut Vec<CallbackEntry<F>> {
        if let InvokeState::Invoking { depth } = self.state {
            self.state = InvokeState::PendingSwap {
                depth,
                shadow: (*self.primary).clone(),
            };
        }
        match &mut self.state {
            InvokeState::PendingSwap { shadow, .. } => shadow,
            _ => Rc::make_mut(&mut self.primary),
        }
    }

    /// The entries a reader sees: the shadow list if a swap is pending.
    fn read_list(&self) -> &[CallbackEntry<F>] {
        match &self.state {
            InvokeState::PendingSwap { shadow, .. } => shadow,
            _ => &self.primary,
        }
    }

    /// Register `callback` for `type_id` in `phase`.
    ///
    /// Returns `false`, leaving the registry untouched, if the same callback is
    /// already registered for that type and phase.
    pub fn register(
        &mut self,
        type_id: EventTypeId,
        phase: CallbackPhase,
        policy: InvokePolicy,
        callback: Rc<F>,
    ) -> bool {
        if self
            .read_list()
            .iter()
            .any(|e| e.same(type_id, phase, &callback))
        {
            return false;
        }
        self.write_list().push(CallbackEntry {
            type_id,
            phase,
            policy,
            callback,
        });
        true
    }

    /// Remove a registration. Returns `false` if it did not exist.
    pub fn unregister(&mut self, type_id: EventTypeId, phase: CallbackPhase, callback: &Rc<F>) -> bool {
        let Some(pos) = self
            .read_list()
            .iter()
            .position(|e| e.same(type_id, phase, callback))
        else {
            return false;
        };
        self.write_list().remove(pos);
        true
    }

    /// Remove every registration for `type_id`.
    pub fn unregister_all(&mut self, type_id: EventTypeId) -> usize {
        let before = self.read_list().len();
        if !self.read_list().iter().any(|e| e.type_id == type_id) {
            return 0;
        }
        let list = self.write_list();
        list.retain(|e| e.type_id != type_id);
        before - list.len()
    }

    /// Whether any callback would run for `type_id` in `phase` on an enabled element.
    pub fn has_callbacks(&self, type_id: EventTypeId, phase: PropagationPhase) -> bool {
        self.read_list()
            .iter()
            .any(|e| e.applies(type_id, phase, true))
    }

    /// Number of registrations (including writes pending a swap).
    pub fn len(&self) -> usize {
        self.read_list().len()
    }

    /// Returns `true` if there are no registrations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an invocation is in progress.
    pub fn is_invoking(&self) -> bool {
        !matches!(self.state, InvokeState::Idle)
    }

    /// Start an invocation and return the list to iterate.
    ///
    /// Must be paired with [`EventCallbackRegistry::end_invoke`].
    pub fn begin_invoke(&mut self) -> CallbackList<F> {
        match &mut self.state {
            InvokeState::Idle => self.state = InvokeState::Invoking { depth: 1 },
            InvokeState::Invoking { depth } | InvokeState::PendingSwap { depth, .. } => *depth += 1,
        }
        self.primary.clone()
    }

    /// End an invocation. The outermost end swaps in pending writes.
    ///
    /// # Panics
    ///
    /// Panics if no invocation is in progress.
    pub fn end_invoke(&mut self) {
        let state = std::mem::replace(&mut self.state, InvokeState::Idle);
        self.state = match state {
            InvokeState::Idle => panic!("end_invoke called without a matching begin_invoke"),
            InvokeState::Invoking { depth: 1 } => InvokeState::Idle,
            InvokeState::Invoking { depth } => InvokeState::Invoking { depth: depth - 1 },
            InvokeState::PendingSwap { depth: 1, shadow } => {
                self.primary = Rc::new(shadow);
                InvokeState::Idle
            }
            InvokeState::PendingSwap { depth, shadow } => InvokeState::PendingSwap {
                depth: depth - 1,
                shadow,
            },
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Cb = dyn Fn(&mut Vec<&'static str>);

    const CLICK: EventTypeId = EventTypeId(40);
    const KEY: EventTypeId = EventTypeId(50);

    fn cb(tag: &'static str) -> Rc<Cb> {
        Rc::new(move |log: &mut Vec<&'static str>| log.push(tag))
    }

    fn run(reg: &mut EventCallbackRegistry<Cb>, phase: PropagationPhase, log: &mut Vec<&'static str>) {
        let list = reg.begin_invoke();
        for e in list.iter().filter(|e| e.applies(CLICK, phase, true)) {
            (e.callback)(log);
        }
        reg.end_invoke();
    }

    #[test]
    fn registration_is_idempotent_per_type_phase_and_callback() {
        let mut reg = EventCallbackRegistry::<Cb>::new();
        let a = cb("a");
        assert!(reg.register(CLICK, CallbackPhase::TargetAndBubbleUp, InvokePolicy::Default, a.clone()));
        assert!(!reg.register(CLICK, CallbackPhase::TargetAndBubbleUp, InvokePolicy::Default, a.clone()));
        assert!(reg.register(CLICK, CallbackPhase::TrickleDownAndTarget, InvokePolicy::Default, a.clone()));
        assert!(reg.register(KEY, CallbackPhase::TargetAndBubbleUp, InvokePolicy::Default, a.clone()));
        // Same code, different allocation: a distinct callback.
        assert!(reg.register(CLICK, CallbackPhase::TargetAndBubbleUp, InvokePolicy::Default, cb("a")));
        assert_eq!(reg.len(), 4);

        assert!(reg.unregister(CLICK, CallbackPhase::TargetAndBubbleUp, &a));
        assert!(!reg.unregister(CLICK, CallbackPhase::TargetAndBubbleUp, &a));
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.unregister_all(CLICK), 2);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn phases_filter_entries() {
        let mut reg = EventCallbackRegistry::<Cb>::new();
        reg.register(CLICK, CallbackPhase::TrickleDownAndTarget, InvokePolicy::Default, cb("trickle"));
        reg.register(CLICK, CallbackPhase::TargetAndBubbleUp, InvokePolicy::Default, cb("bubble"));

        let mut log = Vec::new();
        run(&mut reg, PropagationPhase::TrickleDown, &mut log);
        run(&mut reg, PropagationPhase::AtTarget, &mut log);
        run(&mut reg, PropagationPhase::BubbleUp, &mut log);
        run(&mut reg, PropagationPhase::DefaultAction, &mut log);
        assert_eq!(log, ["trickle", "trickle", "bubble", "bubble"]);
    }

    #[test]
    fn disabled_policy() {
        let mut reg = EventCallbackRegistry::<Cb>::new();
        reg.register(CLICK, CallbackPhase::TargetAndBubbleUp, InvokePolicy::Default, cb("d"));
        reg.register(CLICK, CallbackPhase::TargetAndBubbleUp, InvokePolicy::IncludeDisabled, cb("i"));
        let list = reg.begin_invoke();
        let running: Vec<_> = list
            .iter()
            .filter(|e| e.applies(CLICK, PropagationPhase::AtTarget, false))
            .map(|e| e.policy)
            .collect();
        reg.end_invoke();
        assert_eq!(running, [InvokePolicy::IncludeDisabled]);
    }

    #[test]
    fn writes_during_invocation_are_deferred_until_outermost_end() {
        let mut reg = EventCallbackRegistry::<Cb>::new();
        let a = cb("a");
        reg.register(CLICK, CallbackPhase::TargetAndBubbleUp, InvokePolicy::Default, a.clone());

        let outer = reg.begin_invoke();
        assert!(reg.is_invoking());
        assert!(reg.register(CLICK, CallbackPhase::TargetAndBubbleUp, InvokePolicy::Default, cb("b")));
        assert!(reg.unregister(CLICK, CallbackPhase::TargetAndBubbleUp, &a));
        // The running invocation still sees the original list.
        assert_eq!(outer.len(), 1);
        assert_eq!(reg.len(), 1);

        let inner = reg.begin_invoke();
        assert_eq!(inner.len(), 1);
        assert!(same_callback(&inner[0].callback, &a));
        reg.end_invoke();
        assert!(reg.is_invoking());

        reg.end_invoke();
        assert!(!reg.is_invoking());
        let after = reg.begin_invoke();
        assert_eq!(after.len(), 1);
        assert!(!same_callback(&after[0].callback, &a));
        reg.end_invoke();
    }

    #[derive(Copy, Clone, Debug)]
    enum Op {
        Register(usize, EventTypeId, CallbackPhase),
        Unregister(usize, EventTypeId, CallbackPhase),
        Begin,
        End,
    }

    type Key = (usize, EventTypeId, CallbackPhase);

    fn ops(callbacks: usize, types: &[EventTypeId]) -> Vec<Op> {
        let mut ops = vec![Op::Begin, Op::End];
        for c in 0..callbacks {
            for &t in types {
                for p in [CallbackPhase::TrickleDownAndTarget, CallbackPhase::TargetAndBubbleUp] {
                    ops.push(Op::Register(c, t, p));
                    ops.push(Op::Unregister(c, t, p));
                }
            }
        }
        ops
    }

    fn keys(list: &[CallbackEntry<Cb>], callbacks: &[Rc<Cb>]) -> Vec<Key> {
        list.iter()
            .map(|e| {
                let c = callbacks
                    .iter()
                    .position(|c| same_callback(c, &e.callback))
                    .unwrap();
                (c, e.type_id, e.phase)
            })
            .collect()
    }

    /// Replay `seq` on a registry and on a plain list of keys with set semantics.
    fn check_against_model(seq: &[Op], callbacks: &[Rc<Cb>]) {
        let mut reg = EventCallbackRegistry::<Cb>::new();
        let mut model: Vec<Key> = Vec::new();
        // What an invocation started now sees: the model as of the last idle moment.
        let mut committed: Vec<Key> = Vec::new();
        let mut running: Vec<(CallbackList<Cb>, Vec<Key>)> = Vec::new();
        for &op in seq {
            match op {
                Op::Register(c, t, p) => {
                    let fresh = !model.contains(&(c, t, p));
                    let added = reg.register(t, p, InvokePolicy::Default, callbacks[c].clone());
                    assert_eq!(added, fresh, "{seq:?}");
                    if fresh {
                        model.push((c, t, p));
                    }
                }
                Op::Unregister(c, t, p) => {
                    let pos = model.iter().position(|&k| k == (c, t, p));
                    assert_eq!(reg.unregister(t, p, &callbacks[c]), pos.is_some(), "{seq:?}");
                    if let Some(pos) = pos {
                        model.remove(pos);
                    }
                }
                Op::Begin => running.push((reg.begin_invoke(), committed.clone())),
                Op::End => {
                    if running.pop().is_some() {
                        reg.end_invoke();
                    }
                }
            }
            if running.is_empty() {
                committed.clone_from(&model);
            }
            assert_eq!(reg.len(), model.len(), "{seq:?}");
            assert_eq!(keys(reg.read_list(), callbacks), model, "{seq:?}");
            assert_eq!(reg.is_invoking(), !running.is_empty(), "{seq:?}");
            for (list, seen) in &running {
                assert_eq!(&keys(list, callbacks), seen, "{seq:?}");
            }
        }
        while running.pop().is_some() {
            reg.end_invoke();
        }
        assert_eq!(keys(&reg.begin_invoke(), callbacks), model, "{seq:?}");
        reg.end_invoke();
    }

    fn for_each_sequence(alphabet: &[Op], len: usize, prefix: &mut Vec<Op>, f: &mut dyn FnMut(&[Op])) {
        if prefix.len() == len {
            f(prefix);
            return;
        }
        for &op in alphabet {
            prefix.push(op);
            for_each_sequence(alphabet, len, prefix, f);
            prefix.pop();
        }
    }

    #[test]
    fn every_short_sequence_matches_a_set_model() {
        let callbacks = [cb("a"), cb("b")];
        let mut checked = 0;

        // Two callbacks, two types, both phases: every sequence of four operations.
        let wide = ops(2, &[CLICK, KEY]);
        for_each_sequence(&wide, 4, &mut Vec::new(), &mut |seq| {
            check_against_model(seq, &callbacks);
            checked += 1;
        });

        // One callback and type, with deeper nesting of invocations.
        let deep = ops(1, &[CLICK]);
        for_each_sequence(&deep, 6, &mut Vec::new(), &mut |seq| {
            check_against_model(seq, &callbacks);
            checked += 1;
        });

        assert_eq!(checked, 18_usize.pow(4) + 6_usize.pow(6));
    }

    #[test]
    #[should_panic(expected = "without a matching begin_invoke")]
    fn unbalanced_end_panics() {
        let mut reg = EventCallbackRegistry::<Cb>::new();
        reg.end_invoke();
    }
}

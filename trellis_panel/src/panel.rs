// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The panel: owner of the element tree and of every piece of event state.

use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use kurbo::Rect;
use trellis_event::click::ClickDetector;
use trellis_event::pointer::{PointerDeviceState, SharedPointerState, SurfaceId};
use trellis_event::under_pointer::ElementUnderPointer;
use trellis_event::{
    CallbackPhase, DispatchHost, DispatchMode, Event, EventCallbackRegistry, EventDispatcher,
    EventKind, EventPayload, EventPool, FrameAbort, GeometryData, InvokePolicy,
};
use trellis_focus::{FocusRing, FocusedElementChain, NavigateFocusRing, TabOrderFocusRing};
use trellis_timing::TimerEventScheduler;
use trellis_tree::{ElementFlags, ElementId, ElementProps, ElementTree, PseudoStates};

use crate::capture::CaptureState;
use crate::default_action::DefaultActionHandler;
use crate::dirty::DirtyElements;
use crate::settings::{FocusRingKind, PanelSettings};

/// Event callback signature.
///
/// Callbacks get the event and the whole panel, so they may dispatch events,
/// move focus, capture pointers, or edit the tree. Returning a [`FrameAbort`]
/// abandons the current input frame.
pub type PanelCallback<S> = dyn Fn(&mut Event, &mut Panel<S>) -> Result<(), FrameAbort>;

/// A surface hosting one element tree.
///
/// `S` is host state made available to callbacks, default actions, and timers
/// through [`Panel::state`].
pub struct Panel<S> {
    /// Host state.
    pub state: S,
    pub(crate) tree: ElementTree,
    pub(crate) callbacks: HashMap<ElementId, EventCallbackRegistry<PanelCallback<S>>>,
    pub(crate) default_actions: HashMap<ElementId, Rc<dyn DefaultActionHandler<S>>>,
    pub(crate) pool: EventPool,
    pub(crate) dispatcher: EventDispatcher,
    pub(crate) pointer_state: SharedPointerState,
    pub(crate) surface: SurfaceId,
    pub(crate) under_pointer: ElementUnderPointer,
    pub(crate) clicks: ClickDetector,
    pub(crate) focus: FocusedElementChain,
    pub(crate) focus_ring: Box<dyn FocusRing>,
    pub(crate) capture: CaptureState,
    pub(crate) scheduler: TimerEventScheduler<Panel<S>>,
    pub(crate) dirty_visuals: DirtyElements,
    pub(crate) bind_requests: DirtyElements,
    pub(crate) settings: PanelSettings,
    pub(crate) now_ms: u64,
}

impl<S> fmt::Debug for Panel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Panel")
            .field("tree", &self.tree)
            .field("callbacks", &self.callbacks.len())
            .field("default_actions", &self.default_actions.len())
            .field("pool", &self.pool)
            .field("dispatcher", &self.dispatcher)
            .field("surface", &self.surface)
            .field("focus", &self.focus)
            .field("capture", &self.capture)
            .field("scheduler", &self.scheduler)
            .field("settings", &self.settings)
            .field("now_ms", &self.now_ms)
            .finish_non_exhaustive()
    }
}

impl<S> Drop for Panel<S> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.pointer_state.try_borrow_mut() {
            state.remove_surface(self.surface);
        }
    }
}

fn make_focus_ring(settings: &PanelSettings) -> Box<dyn FocusRing> {
    match settings.focus_ring {
        FocusRingKind::TabOrder => Box::new(TabOrderFocusRing::new(settings.default_focus_order)),
        FocusRingKind::Navigate => Box::new(NavigateFocusRing::new(settings.default_focus_order)),
    }
}

impl<S> Panel<S> {
    /// Create a panel with its own pointer state.
    pub fn new(state: S, settings: PanelSettings) -> Self {
        Self::with_pointer_state(state, settings, PointerDeviceState::shared(), SurfaceId(0))
    }

    /// Create a panel sharing `pointer_state` with other surfaces.
    ///
    /// `surface` identifies this panel in the shared state; its entries are
    /// cleared when the panel is dropped.
    pub fn with_pointer_state(
        state: S,
        settings: PanelSettings,
        pointer_state: SharedPointerState,
        surface: SurfaceId,
    ) -> Self {
        Self {
            state,
            tree: ElementTree::new(),
            callbacks: HashMap::new(),
            default_actions: HashMap::new(),
            pool: EventPool::with_capacity(settings.event_pool_capacity),
            dispatcher: EventDispatcher::new(),
            pointer_state,
            surface,
            under_pointer: ElementUnderPointer::new(),
            clicks: ClickDetector::new(settings.click),
            focus: FocusedElementChain::new(),
            focus_ring: make_focus_ring(&settings),
            capture: CaptureState::default(),
            scheduler: TimerEventScheduler::new(),
            dirty_visuals: DirtyElements::default(),
            bind_requests: DirtyElements::default(),
            settings,
            now_ms: 0,
        }
    }

    /// The settings the panel was created with.
    pub fn settings(&self) -> &PanelSettings {
        &self.settings
    }

    /// Replace the focus ring.
    pub fn set_focus_ring(&mut self, ring: Box<dyn FocusRing>) {
        self.focus_ring = ring;
    }

    /// The element tree.
    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    /// The pointer state this panel writes to.
    pub fn pointer_state(&self) -> &SharedPointerState {
        &self.pointer_state
    }

    /// This panel's surface id in the pointer state.
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// The event pool, mostly for its counters.
    pub fn event_pool(&self) -> &EventPool {
        &self.pool
    }

    /// The dispatcher, mostly for its counters.
    pub fn event_dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    // --- tree edits ---------------------------------------------------------

    /// Insert an element. With no parent the element becomes the root.
    pub fn insert(&mut self, parent: Option<ElementId>, props: ElementProps) -> ElementId {
        let disabled = props.flags.contains(ElementFlags::DISABLED);
        let id = self.tree.insert(parent, props);
        if disabled {
            self.tree.set_pseudo_state(id, PseudoStates::DISABLED, true);
        }
        self.dirty_visuals.mark(id);
        id
    }

    /// Remove an element and its subtree, and forget everything tracked about them:
    /// callbacks, default actions, pointer and mouse capture, focus, hover, clicks,
    /// pending visual and binding requests.
    ///
    /// Returns the removed ids in preorder.
    pub fn remove_element(&mut self, id: ElementId) -> Vec<ElementId> {
        let parent = self.tree.parent_of(id);
        let removed = self.tree.remove(id);
        if removed.is_empty() {
            tracing::warn!(?id, "remove_element on a stale element");
            return removed;
        }
        for r in &removed {
            self.callbacks.remove(r);
            self.default_actions.remove(r);
        }
        self.capture.forget(&removed);
        if self.focus.purge(&self.tree) {
            tracing::debug!(?id, "focused element removed");
        }
        self.under_pointer.retarget_removed(&removed, parent);
        self.clicks.cleanup(&removed);
        self.dirty_visuals.forget(&removed);
        self.bind_requests.forget(&removed);
        if let Some(parent) = parent {
            self.dirty_visuals.mark(parent);
        }
        removed
    }

    /// Replace the flags of an element, keeping the `DISABLED` pseudo state in sync.
    pub fn set_flags(&mut self, id: ElementId, flags: ElementFlags) -> bool {
        if !self.tree.set_flags(id, flags) {
            return false;
        }
        self.tree
            .set_pseudo_state(id, PseudoStates::DISABLED, flags.contains(ElementFlags::DISABLED));
        self.dirty_visuals.mark(id);
        true
    }

    /// Set the tab index of an element.
    pub fn set_tab_index(&mut self, id: ElementId, tab_index: i32) -> bool {
        self.tree.set_tab_index(id, tab_index)
    }

    /// Insert or remove pseudo states. Changes mark the element's visuals dirty.
    pub fn set_pseudo_state(&mut self, id: ElementId, states: PseudoStates, on: bool) -> bool {
        let changed = self.tree.set_pseudo_state(id, states, on);
        if changed {
            self.dirty_visuals.mark(id);
        }
        changed
    }

    /// Write a resolved layout rectangle.
    ///
    /// An actual change resets the padding rectangle to `layout`, marks the
    /// element's visuals dirty, and sends it a `GeometryChanged` event. NaN
    /// rectangles are ignored.
    pub fn set_layout(&mut self, id: ElementId, layout: Rect) -> Result<(), FrameAbort> {
        let Some(old_rect) = self.tree.set_layout(id, layout) else {
            return Ok(());
        };
        self.tree.set_padding_rect(id, layout);
        self.dirty_visuals.mark(id);
        self.send_event(
            EventKind::GeometryChanged,
            EventPayload::Geometry(GeometryData {
                old_rect,
                new_rect: layout,
            }),
            Some(id),
        )
    }

    /// Write the padding (content) rectangle of an element.
    pub fn set_padding_rect(&mut self, id: ElementId, rect: Rect) -> bool {
        self.tree.set_padding_rect(id, rect)
    }

    /// Take the elements whose visuals changed since the last call, in first-change order.
    pub fn take_dirty_visuals(&mut self) -> Vec<ElementId> {
        self.dirty_visuals.drain_alive(&self.tree)
    }

    /// Ask the binding system to update `id`.
    pub fn request_bind(&mut self, id: ElementId) -> bool {
        if !self.tree.is_alive(id) {
            tracing::warn!(?id, "bind request for a stale element");
            return false;
        }
        self.bind_requests.mark(id)
    }

    /// Take the elements with pending binding requests. Removed elements are skipped.
    pub fn poll_elements_with_bindings(&mut self) -> Vec<ElementId> {
        self.bind_requests.drain_alive(&self.tree)
    }

    // --- callbacks ----------------------------------------------------------

    /// Register a callback for events of `kind` on `element`.
    ///
    /// Returns `false` if the element is stale or if the same callback is already
    /// registered for that kind and phase.
    pub fn register_callback(
        &mut self,
        element: ElementId,
        kind: EventKind,
        phase: CallbackPhase,
        policy: InvokePolicy,
        callback: Rc<PanelCallback<S>>,
    ) -> bool {
        if !self.tree.is_alive(element) {
            tracing::warn!(?element, ?kind, "callback registration on a stale element");
            return false;
        }
        self.callbacks
            .entry(element)
            .or_insert_with(EventCallbackRegistry::new)
            .register(kind.type_id(), phase, policy, callback)
    }

    /// Register a bubble-phase callback with the default policy and return it
    /// for later unregistration.
    pub fn on(
        &mut self,
        element: ElementId,
        kind: EventKind,
        callback: impl Fn(&mut Event, &mut Self) -> Result<(), FrameAbort> + 'static,
    ) -> Rc<PanelCallback<S>> {
        let callback: Rc<PanelCallback<S>> = Rc::new(callback);
        self.register_callback(
            element,
            kind,
            CallbackPhase::TargetAndBubbleUp,
            InvokePolicy::Default,
            callback.clone(),
        );
        callback
    }

    /// Remove a registration. Returns `false` if it did not exist.
    pub fn unregister_callback(
        &mut self,
        element: ElementId,
        kind: EventKind,
        phase: CallbackPhase,
        callback: &Rc<PanelCallback<S>>,
    ) -> bool {
        self.callbacks
            .get_mut(&element)
            .is_some_and(|r| r.unregister(kind.type_id(), phase, callback))
    }

    /// Number of registrations on `element`.
    pub fn callback_count(&self, element: ElementId) -> usize {
        self.callbacks.get(&element).map_or(0, EventCallbackRegistry::len)
    }

    /// Install the default action handler of `element`, returning the previous one.
    pub fn set_default_action_handler(
        &mut self,
        element: ElementId,
        handler: Rc<dyn DefaultActionHandler<S>>,
    ) -> Option<Rc<dyn DefaultActionHandler<S>>> {
        if !self.tree.is_alive(element) {
            tracing::warn!(?element, "default action handler on a stale element");
            return None;
        }
        self.default_actions.insert(element, handler)
    }

    /// Remove the default action handler of `element`.
    pub fn clear_default_action_handler(
        &mut self,
        element: ElementId,
    ) -> Option<Rc<dyn DefaultActionHandler<S>>> {
        self.default_actions.remove(&element)
    }

    // --- dispatch -----------------------------------------------------------

    /// Panel time in milliseconds, stamped on new events.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Set the panel time without running timers.
    pub fn set_time(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        self.scheduler.set_time(now_ms);
    }

    /// Take an event from the pool, stamped with the panel time.
    pub fn acquire_event(&mut self, kind: EventKind, payload: EventPayload) -> Event {
        self.pool.acquire(kind, payload, self.now_ms)
    }

    /// Dispatch an event. See [`EventDispatcher`] for queueing rules.
    pub fn dispatch(&mut self, event: Event, mode: DispatchMode) -> Result<(), FrameAbort> {
        EventDispatcher::dispatch(self, event, mode)
    }

    /// Acquire and dispatch (queued) an event of `kind` aimed at `target`.
    ///
    /// Without a target the dispatch strategies pick one: the element under the
    /// pointer for pointer events, the focused element for keyboard, navigation
    /// and command events.
    pub fn send_event(
        &mut self,
        kind: EventKind,
        payload: EventPayload,
        target: Option<ElementId>,
    ) -> Result<(), FrameAbort> {
        let mut event = self.acquire_event(kind, payload);
        event.set_target(target);
        self.dispatch(event, DispatchMode::Queued)
    }

    /// Defer queued dispatches until the matching [`open_gate`](Self::open_gate).
    pub fn close_gate(&mut self) {
        self.dispatcher.close_gate();
    }

    /// Reopen a gate; the last one drains the queue.
    pub fn open_gate(&mut self) -> Result<(), FrameAbort> {
        EventDispatcher::open_gate(self)
    }

    /// Flush the queue and start an isolated dispatch context.
    pub fn push_dispatcher_context(&mut self) -> Result<(), FrameAbort> {
        EventDispatcher::push_dispatcher_context(self)
    }

    /// Restore the context saved by the matching push.
    pub fn pop_dispatcher_context(&mut self) {
        self.dispatcher.pop_dispatcher_context();
    }

    // --- timers -------------------------------------------------------------

    /// The timer scheduler; actions receive the panel.
    pub fn scheduler(&mut self) -> &mut TimerEventScheduler<Self> {
        &mut self.scheduler
    }

    /// Advance the panel clock and run due timers.
    pub fn update(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        TimerEventScheduler::update_scheduled_events(self, now_ms, |p| &mut p.scheduler);
    }
}

impl<S> DispatchHost for Panel<S> {
    fn dispatcher(&mut self) -> &mut EventDispatcher {
        &mut self.dispatcher
    }

    fn process_event(&mut self, event: &mut Event) -> Result<(), FrameAbort> {
        self.process(event)
    }

    fn release_event(&mut self, event: Event) {
        self.pool.release(event);
    }
}

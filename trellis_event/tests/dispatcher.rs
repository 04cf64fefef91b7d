// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Queueing, gating, context, and abort behavior of the event dispatcher.

use trellis_event::{
    DispatchHost, DispatchMode, Event, EventDispatcher, EventKind, EventPayload, EventPool,
    FrameAbort,
};

/// What a test host does when it processes an event of a given custom kind.
#[derive(Clone, Copy)]
enum Reaction {
    Nothing,
    DispatchQueued(u16),
    DispatchImmediate(u16),
    Abort,
}

#[derive(Default)]
struct Host {
    dispatcher: EventDispatcher,
    pool: EventPool,
    log: Vec<String>,
    reactions: Vec<(u16, Reaction)>,
}

impl Host {
    fn event(&mut self, n: u16) -> Event {
        self.pool
            .acquire(EventKind::Custom(n), EventPayload::None, 0)
    }

    fn react(mut self, n: u16, reaction: Reaction) -> Self {
        self.reactions.push((n, reaction));
        self
    }

    fn reaction(&self, n: u16) -> Reaction {
        self.reactions
            .iter()
            .find(|(k, _)| *k == n)
            .map_or(Reaction::Nothing, |(_, r)| *r)
    }
}

fn custom(event: &Event) -> u16 {
    match event.kind() {
        EventKind::Custom(n) => n,
        other => panic!("unexpected {other:?}"),
    }
}

impl DispatchHost for Host {
    fn dispatcher(&mut self) -> &mut EventDispatcher {
        &mut self.dispatcher
    }

    fn process_event(&mut self, event: &mut Event) -> Result<(), FrameAbort> {
        let n = custom(event);
        self.log.push(format!("begin {n}"));
        let result = match self.reaction(n) {
            Reaction::Nothing => Ok(()),
            Reaction::DispatchQueued(m) => {
                let e = self.event(m);
                EventDispatcher::dispatch(self, e, DispatchMode::Queued)
            }
            Reaction::DispatchImmediate(m) => {
                let e = self.event(m);
                EventDispatcher::dispatch(self, e, DispatchMode::Immediate)
            }
            Reaction::Abort => Err(FrameAbort),
        };
        self.log.push(format!("end {n}"));
        result
    }

    fn release_event(&mut self, event: Event) {
        self.log.push(format!("release {}", custom(&event)));
        self.pool.release(event);
    }
}

#[test]
fn queued_dispatch_from_a_handler_runs_after_the_current_event() {
    let mut host = Host::default().react(1, Reaction::DispatchQueued(2));
    let e = host.event(1);
    EventDispatcher::dispatch(&mut host, e, DispatchMode::Queued).unwrap();
    assert_eq!(
        host.log,
        ["begin 1", "end 1", "release 1", "begin 2", "end 2", "release 2"]
    );
    assert_eq!(host.pool.outstanding(), 0);
    assert_eq!(host.dispatcher.gate_count(), 0);
}

#[test]
fn immediate_dispatch_from_a_handler_nests() {
    let mut host = Host::default().react(1, Reaction::DispatchImmediate(2));
    let e = host.event(1);
    EventDispatcher::dispatch(&mut host, e, DispatchMode::Queued).unwrap();
    assert_eq!(
        host.log,
        ["begin 1", "begin 2", "end 2", "release 2", "end 1", "release 1"]
    );
}

#[test]
fn closed_gate_defers_until_last_open() {
    let mut host = Host::default();
    host.dispatcher.close_gate();
    host.dispatcher.close_gate();
    for n in [1, 2, 3] {
        let e = host.event(n);
        EventDispatcher::dispatch(&mut host, e, DispatchMode::Queued).unwrap();
    }
    assert!(host.log.is_empty());
    assert_eq!(host.dispatcher.queued_len(), 3);

    EventDispatcher::open_gate(&mut host).unwrap();
    assert!(host.log.is_empty());
    EventDispatcher::open_gate(&mut host).unwrap();
    let begins: Vec<_> = host
        .log
        .iter()
        .filter(|l| l.starts_with("begin"))
        .cloned()
        .collect();
    assert_eq!(begins, ["begin 1", "begin 2", "begin 3"]);
    assert_eq!(host.pool.acquired(), host.pool.released());
}

#[test]
fn events_queued_during_a_drain_wait_behind_earlier_ones() {
    let mut host = Host::default()
        .react(1, Reaction::DispatchQueued(3))
        .react(3, Reaction::DispatchQueued(4));
    host.dispatcher.close_gate();
    for n in [1, 2] {
        let e = host.event(n);
        EventDispatcher::dispatch(&mut host, e, DispatchMode::Queued).unwrap();
    }
    EventDispatcher::open_gate(&mut host).unwrap();
    let begins: Vec<_> = host
        .log
        .iter()
        .filter(|l| l.starts_with("begin"))
        .cloned()
        .collect();
    assert_eq!(begins, ["begin 1", "begin 2", "begin 3", "begin 4"]);
    assert_eq!(host.pool.outstanding(), 0);
    assert!(!host.dispatcher.is_processing_queue());
}

#[test]
#[should_panic(expected = "without a matching close_gate")]
fn gate_underflow_panics() {
    let mut host = Host::default();
    let _ = EventDispatcher::open_gate(&mut host);
}

#[test]
fn context_push_flushes_and_isolates() {
    let mut host = Host::default();
    host.dispatcher.close_gate();
    let e = host.event(1);
    EventDispatcher::dispatch(&mut host, e, DispatchMode::Queued).unwrap();
    // The push flushes the outer queue even though the outer gate is closed.
    EventDispatcher::push_dispatcher_context(&mut host).unwrap();
    assert_eq!(host.log[0], "begin 1");
    assert_eq!(host.dispatcher.gate_count(), 0);
    assert_eq!(host.dispatcher.context_depth(), 1);

    let e = host.event(2);
    EventDispatcher::dispatch(&mut host, e, DispatchMode::Queued).unwrap();
    assert!(host.log.contains(&"end 2".to_string()));

    host.dispatcher.pop_dispatcher_context();
    assert_eq!(host.dispatcher.gate_count(), 1);
    EventDispatcher::open_gate(&mut host).unwrap();
}

#[test]
#[should_panic(expected = "closed gate")]
fn popping_an_undrained_context_panics() {
    let mut host = Host::default();
    EventDispatcher::push_dispatcher_context(&mut host).unwrap();
    host.dispatcher.close_gate();
    let e = host.event(1);
    EventDispatcher::dispatch(&mut host, e, DispatchMode::Queued).unwrap();
    host.dispatcher.pop_dispatcher_context();
}

#[test]
#[should_panic(expected = "without a matching push")]
fn popping_without_push_panics() {
    let mut host = Host::default();
    host.dispatcher.pop_dispatcher_context();
}

#[test]
fn abort_releases_event_and_keeps_draining() {
    let mut host = Host::default().react(1, Reaction::Abort);
    host.dispatcher.close_gate();
    for n in [1, 2] {
        let e = host.event(n);
        EventDispatcher::dispatch(&mut host, e, DispatchMode::Queued).unwrap();
    }
    assert_eq!(EventDispatcher::open_gate(&mut host), Err(FrameAbort));
    assert!(host.log.contains(&"release 1".to_string()));
    assert!(host.log.contains(&"end 2".to_string()));
    assert_eq!(host.pool.outstanding(), 0);
    assert_eq!(host.dispatcher.gate_count(), 0);
    assert!(!host.dispatcher.is_processing_queue());
}

#[test]
fn abort_of_an_immediate_dispatch_is_returned() {
    let mut host = Host::default().react(7, Reaction::Abort);
    let e = host.event(7);
    assert_eq!(
        EventDispatcher::dispatch(&mut host, e, DispatchMode::Immediate),
        Err(FrameAbort)
    );
    assert_eq!(host.pool.outstanding(), 0);
    assert_eq!(host.dispatcher.gate_count(), 0);
}

#[test]
#[should_panic(expected = "second frame abort")]
fn second_abort_in_one_drain_panics() {
    let mut host = Host::default()
        .react(1, Reaction::Abort)
        .react(2, Reaction::Abort);
    host.dispatcher.close_gate();
    for n in [1, 2] {
        let e = host.event(n);
        EventDispatcher::dispatch(&mut host, e, DispatchMode::Queued).unwrap();
    }
    let _ = EventDispatcher::open_gate(&mut host);
}

// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Timing: a cooperative timer queue for single-threaded UI runtimes.
//!
//! [`TimerEventScheduler`] keeps a list of scheduled actions and runs the due ones
//! each time the host calls [`TimerEventScheduler::update_scheduled_events`], usually
//! once per frame. There are no threads and no wall clock: the host passes the
//! current time in milliseconds.
//!
//! Actions receive the host context mutably. The scheduler lives inside that
//! context, so an action may schedule or unschedule items while a pass is in
//! progress; those changes are buffered until the pass ends.
//!
//! ## Example
//!
//! ```
//! use trellis_timing::TimerEventScheduler;
//!
//! #[derive(Default)]
//! struct Host {
//!     timers: TimerEventScheduler<Host>,
//!     ticks: u32,
//! }
//!
//! let mut host = Host::default();
//! host.timers.schedule_every(0, 16, |h: &mut Host, _| h.ticks += 1);
//!
//! for now in [0, 8, 16, 32] {
//!     TimerEventScheduler::update_scheduled_events(&mut host, now, |h| &mut h.timers);
//! }
//! assert_eq!(host.ticks, 3);
//! ```

mod scheduler;

pub use scheduler::{ScheduledItemId, TimerError, TimerEventScheduler, TimerState};

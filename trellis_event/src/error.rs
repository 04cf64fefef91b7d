// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Out-of-band request to abandon the current input frame.
///
/// A callback returns this to unwind the event being processed. The dispatcher
/// still releases the event and its gate, finishes draining its queue, and then
/// surfaces the abort to the caller of the drain. At most one abort may surface
/// per drain.
#[derive(Copy, Clone, Debug, Default, Error, PartialEq, Eq, Hash)]
#[error("input frame aborted")]
pub struct FrameAbort;

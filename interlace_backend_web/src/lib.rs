// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for interlace.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebHost`]: `performance.now()` clock and `setTimeout(.., 0)` deferral
//! - [`Interlace`] and [`interlace`]: the JavaScript entry points, calling
//!   back into JS for every block

mod entry;
mod timer;

pub use entry::{Interlace, interlace};
pub use timer::WebHost;

use interlace_core::time::{HostTime, Timebase};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    timer::millis_to_host_time(timer::performance_now())
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
#[must_use]
pub const fn timebase() -> Timebase {
    Timebase::new(1000, 1)
}

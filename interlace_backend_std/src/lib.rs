// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native host for interlace.
//!
//! This crate provides a [`Host`] for desktop and command-line programs:
//!
//! - Time comes from [`std::time::Instant`], in nanosecond ticks since the
//!   host was created.
//! - [`Host::defer`] appends to a single-threaded FIFO queue. The application
//!   owns the loop: call [`StdHost::run_next`] between its own work (input,
//!   redraw), or [`StdHost::run_until_idle`] to drain everything.
//!
//! ```rust,ignore
//! let host = Rc::new(StdHost::new());
//! let interlacer = Interlacer::new(Rc::clone(&host), BatchConfig::interactive());
//! interlacer.start(geometry, DEFAULT_BLOCK_EDGE, sink)?;
//! while host.run_next() {
//!     handle_input();
//! }
//! ```
//!
//! [`Host`]: interlace_core::host::Host
//! [`Host::defer`]: interlace_core::host::Host::defer

mod queue;

use std::fmt;
use std::time::Instant;

use interlace_core::host::{Clock, Host};
use interlace_core::time::{HostTime, Timebase};

use crate::queue::TaskQueue;

/// Returns the std host [`Timebase`]: host ticks are nanoseconds.
#[must_use]
pub const fn timebase() -> Timebase {
    Timebase::NANOS
}

/// Converts the time elapsed since `epoch` to nanosecond ticks, saturating.
fn host_time_since(epoch: Instant, now: Instant) -> HostTime {
    let nanos = now.saturating_duration_since(epoch).as_nanos();
    HostTime(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Single-threaded host with a monotonic clock and a FIFO task queue.
///
/// Not `Send`: tasks are run on the thread that drains the queue.
pub struct StdHost {
    epoch: Instant,
    queue: TaskQueue,
}

impl StdHost {
    /// Creates a host whose clock reads zero now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            queue: TaskQueue::default(),
        }
    }

    /// Runs the oldest deferred task. Returns `false` if nothing was queued.
    pub fn run_next(&self) -> bool {
        self.queue.run_next()
    }

    /// Runs deferred tasks until the queue is empty. Returns how many ran.
    ///
    /// Tasks deferred while draining are run too.
    pub fn run_until_idle(&self) -> u64 {
        let before = self.queue.executed();
        while self.queue.run_next() {}
        self.queue.executed() - before
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Total number of tasks run so far.
    #[must_use]
    pub fn executed(&self) -> u64 {
        self.queue.executed()
    }
}

impl Default for StdHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdHost {
    fn now(&self) -> HostTime {
        host_time_since(self.epoch, Instant::now())
    }

    fn timebase(&self) -> Timebase {
        timebase()
    }
}

impl Host for StdHost {
    fn defer(&self, task: Box<dyn FnOnce()>) {
        self.queue.push(task);
    }
}

impl fmt::Debug for StdHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdHost")
            .field("epoch", &self.epoch)
            .field("queue", &self.queue)
            .finish()
    }
}

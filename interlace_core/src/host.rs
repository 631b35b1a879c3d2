// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for platform integrations.
//!
//! Interlace splits platform-specific work into *backend* crates. Each backend
//! provides:
//!
//! - **Time**: a [`Clock`] reading the platform's monotonic clock, plus the
//!   [`Timebase`] for its tick unit. The scheduler measures every batch with
//!   it.
//!
//! - **Deferral**: [`Host::defer`], which posts a task to the back of the
//!   platform's task queue (`setTimeout(.., 0)` on the web, a FIFO queue the
//!   application drains on native). Yielding between batches is what keeps
//!   input handling and redraws from starving.
//!
//! All scheduling happens on the thread that owns the host. Tasks are
//! `FnOnce` closures that are never sent across threads.
//!
//! # Run loop pseudocode
//!
//! ```rust,ignore
//! let interlacer = Interlacer::new(host.clone(), BatchConfig::interactive());
//! interlacer.start(geometry, DEFAULT_BLOCK_EDGE, sink)?;
//! // The first batch has already run. Later batches run from the host queue:
//! while host.run_next() {
//!     // input handling, redraw, ...
//! }
//! ```

use alloc::boxed::Box;
use alloc::rc::Rc;

use crate::time::{HostTime, Timebase};

/// A monotonic clock.
pub trait Clock {
    /// Current host time.
    fn now(&self) -> HostTime;

    /// Conversion factor from this clock's ticks to nanoseconds.
    fn timebase(&self) -> Timebase;
}

/// A single-threaded host environment with a task queue.
pub trait Host: Clock {
    /// Runs `task` after the work already queued on the host.
    ///
    /// Must not run `task` synchronously.
    fn defer(&self, task: Box<dyn FnOnce()>);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> HostTime {
        (**self).now()
    }

    fn timebase(&self) -> Timebase {
        (**self).timebase()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> HostTime {
        (**self).now()
    }

    fn timebase(&self) -> Timebase {
        (**self).timebase()
    }
}

impl<H: Host + ?Sized> Host for Rc<H> {
    fn defer(&self, task: Box<dyn FnOnce()>) {
        (**self).defer(task);
    }
}

// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative driver that re-posts batches to the host's task queue.
//!
//! [`Interlacer`] is the entry point most applications want: it pairs a
//! [`Scheduler`] with a [`Host`], runs the first batch of a new run
//! immediately, and defers every following batch through
//! [`Host::defer`] until the run completes, fails, or is superseded.
//!
//! The scheduler is never borrowed while the sink runs, so sinks may start or
//! cancel runs on the same interlacer (for example to chain renders from a
//! completion callback). Trace sinks must not call back into the interlacer.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::error::{InterlaceError, RunFailure};
use crate::geometry::Geometry;
use crate::host::Host;
use crate::scheduler::{BatchConfig, BatchOutcome, Progress, RunToken, Scheduler};
use crate::sink::BlockSink;
use crate::trace::{TraceSink, Tracer};

/// Drives interlaced runs on a single-threaded host.
///
/// Cloning is cheap; clones share the same scheduler, so a clone can be moved
/// into callbacks.
pub struct Interlacer<H: Host + 'static, S: BlockSink + 'static> {
    inner: Rc<Inner<H, S>>,
}

struct Inner<H, S: BlockSink> {
    host: H,
    scheduler: RefCell<Scheduler<S>>,
    trace: RefCell<Option<Box<dyn TraceSink>>>,
    failure: RefCell<Option<RunFailure<S::Error>>>,
}

impl<H: Host + 'static, S: BlockSink + 'static> Interlacer<H, S> {
    /// Creates an interlacer with no live run.
    pub fn new(host: H, config: BatchConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                host,
                scheduler: RefCell::new(Scheduler::new(config)),
                trace: RefCell::new(None),
                failure: RefCell::new(None),
            }),
        }
    }

    /// The host batches are deferred to.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.inner.host
    }

    /// Installs (or with `None`, removes) the sink that receives trace events.
    pub fn set_trace_sink(&self, sink: Option<Box<dyn TraceSink>>) {
        *self.inner.trace.borrow_mut() = sink;
    }

    /// Starts a run, superseding any live one, and fills its first batch
    /// before returning.
    pub fn start(
        &self,
        geometry: Geometry,
        initial_edge: u32,
        sink: S,
    ) -> Result<RunToken, InterlaceError> {
        let token = self.inner.with_tracer(|scheduler, tracer| {
            scheduler.start(geometry, initial_edge, sink, tracer)
        })?;
        pump(&self.inner, token);
        Ok(token)
    }

    /// Cancels `token` if it is the live run. Returns whether it was.
    pub fn cancel(&self, token: RunToken) -> bool {
        self.inner
            .with_tracer(|scheduler, tracer| scheduler.cancel(token, tracer))
    }

    /// Returns `true` while `token` is the live run.
    #[must_use]
    pub fn is_running(&self, token: RunToken) -> bool {
        self.inner.scheduler.borrow().is_active(token)
    }

    /// Progress of the live run, if any.
    #[must_use]
    pub fn progress(&self) -> Option<Progress> {
        self.inner.scheduler.borrow().progress()
    }

    /// Current batch-size estimate.
    #[must_use]
    pub fn batch_size(&self) -> u32 {
        self.inner.scheduler.borrow().batch_size()
    }

    /// Takes the most recent sink failure, if a run was aborted since the last
    /// call.
    ///
    /// Only live runs record failures. A sink that fails after its run was
    /// superseded or cancelled leaves the slot alone.
    pub fn take_failure(&self) -> Option<RunFailure<S::Error>> {
        self.inner.failure.borrow_mut().take()
    }
}

impl<H, S: BlockSink> Inner<H, S> {
    fn with_tracer<R>(&self, f: impl FnOnce(&mut Scheduler<S>, &mut Tracer<'_>) -> R) -> R {
        let mut trace = self.trace.borrow_mut();
        let mut tracer = match trace.as_deref_mut() {
            Some(sink) => Tracer::new(sink),
            None => Tracer::none(),
        };
        f(&mut self.scheduler.borrow_mut(), &mut tracer)
    }
}

/// Runs one batch of `token` and re-posts the next one if the run is pending.
fn pump<H: Host + 'static, S: BlockSink + 'static>(inner: &Rc<Inner<H, S>>, token: RunToken) {
    let batch = inner.scheduler.borrow_mut().checkout(token);
    let Some(batch) = batch else {
        return;
    };
    let executed = batch.execute(&inner.host);
    let (live, settled, completed) = inner.with_tracer(|scheduler, tracer| {
        let live = scheduler.is_active(token);
        let settled = scheduler.settle(executed, tracer);
        (live, settled, scheduler.take_completed())
    });
    if let Some(mut sink) = completed {
        sink.complete();
    }
    match settled {
        Ok(BatchOutcome::Yielded { .. }) => {
            let inner_next = Rc::clone(inner);
            inner
                .host
                .defer(Box::new(move || pump(&inner_next, token)));
        }
        Ok(BatchOutcome::Completed { .. } | BatchOutcome::Superseded) => {}
        Err(failure) if live => {
            *inner.failure.borrow_mut() = Some(failure);
        }
        Err(_) => {}
    }
}

impl<H: Host + 'static, S: BlockSink + 'static> Clone for Interlacer<H, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: Host + 'static, S: BlockSink + 'static> fmt::Debug for Interlacer<H, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheduler = self.inner.scheduler.try_borrow();
        f.debug_struct("Interlacer")
            .field("scheduler", &scheduler.as_deref().ok())
            .field("tracing", &self.inner.trace.try_borrow().map(|t| t.is_some()).ok())
            .finish_non_exhaustive()
    }
}

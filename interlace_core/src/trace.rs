// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for runs and batches.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! scheduler emits. All method bodies default to no-ops, so implementing only
//! the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.

use alloc::rc::Rc;
use core::cell::RefCell;

use crate::geometry::Geometry;
use crate::scheduler::RunToken;
use crate::time::{Duration, HostTime};
use crate::traversal::Pass;

/// Why a run stopped producing blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunEndReason {
    /// The final block was filled and the sink was told.
    Completed,
    /// A newer run was started on the same scheduler.
    Superseded,
    /// The run was cancelled explicitly.
    Cancelled,
    /// The sink returned an error.
    Failed,
}

/// Emitted when a run is started.
#[derive(Clone, Copy, Debug)]
pub struct RunStartEvent {
    /// The new run.
    pub run: RunToken,
    /// Grid being traversed.
    pub geometry: Geometry,
    /// Edge of the coarse pass blocks.
    pub initial_edge: u32,
    /// Batch-size estimate the first batch will use.
    pub batch_size: u32,
}

/// Emitted after every batch that ran.
#[derive(Clone, Copy, Debug)]
pub struct BatchEvent {
    /// Run the batch belonged to.
    pub run: RunToken,
    /// One-based batch counter within the run.
    pub batch_index: u32,
    /// Host time when the batch started.
    pub started_at: HostTime,
    /// Wall-clock time spent in the batch.
    pub elapsed: Duration,
    /// Block budget the batch was given.
    pub budget: u32,
    /// Blocks actually filled.
    pub blocks: u32,
    /// Blocks filled by the run so far.
    pub visited: u64,
    /// Total blocks in the run.
    pub total: u64,
    /// Pass the next block belongs to.
    pub pass: Pass,
    /// Batch-size estimate after tuning.
    pub next_batch_size: u32,
}

/// Emitted when a run ends for any reason.
#[derive(Clone, Copy, Debug)]
pub struct RunEndEvent {
    /// The run that ended.
    pub run: RunToken,
    /// Why it ended.
    pub reason: RunEndReason,
    /// Blocks filled by the run.
    pub visited: u64,
    /// Batches executed by the run.
    pub batches: u32,
}

/// Receives trace events from the scheduler.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called when a run starts.
    fn on_run_start(&mut self, e: &RunStartEvent) {
        _ = e;
    }

    /// Called after each batch.
    fn on_batch(&mut self, e: &BatchEvent) {
        _ = e;
    }

    /// Called when a run ends.
    fn on_run_end(&mut self, e: &RunEndEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

/// Forwards every event to both sinks, first `A` then `B`.
impl<A: TraceSink, B: TraceSink> TraceSink for (A, B) {
    fn on_run_start(&mut self, e: &RunStartEvent) {
        self.0.on_run_start(e);
        self.1.on_run_start(e);
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        self.0.on_batch(e);
        self.1.on_batch(e);
    }

    fn on_run_end(&mut self, e: &RunEndEvent) {
        self.0.on_run_end(e);
        self.1.on_run_end(e);
    }
}

/// Lets a sink installed on a driver stay readable from outside.
///
/// The sink must not be borrowed while the driver is emitting events.
impl<T: TraceSink + ?Sized> TraceSink for Rc<RefCell<T>> {
    fn on_run_start(&mut self, e: &RunStartEvent) {
        self.borrow_mut().on_run_start(e);
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        self.borrow_mut().on_batch(e);
    }

    fn on_run_end(&mut self, e: &RunEndEvent) {
        self.borrow_mut().on_run_end(e);
    }
}

/// Thin wrapper around an optional [`TraceSink`].
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`RunStartEvent`].
    #[inline]
    pub fn run_start(&mut self, e: &RunStartEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_run_start(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BatchEvent`].
    #[inline]
    pub fn batch(&mut self, e: &BatchEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_batch(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RunEndEvent`].
    #[inline]
    pub fn run_end(&mut self, e: &RunEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_run_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

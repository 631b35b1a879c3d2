// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interlaced block traversal and cooperative batch scheduling.
//!
//! `interlace_core` turns a pixel grid into a deterministic sequence of
//! block fills that approximate the whole image at a coarse resolution first
//! and then refine it, and slices that sequence into time-bounded batches so a
//! single-threaded host (a browser tab, a UI thread) stays responsive while a
//! large image is drawn. It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   Interlacer::start(geometry, edge, sink)
//!       │
//!       ▼
//!   Scheduler::checkout() ──► Batch::execute() ──► Scheduler::settle()
//!       ▲                        │ Traversal ──► BlockSink::fill()    │
//!       │                                                             │
//!       └──────────── Host::defer() ◄── BatchOutcome::Yielded ◄───────┘
//! ```
//!
//! **[`traversal`]**: The block-sequence generator: a coarse lattice pass
//! followed by alternating x-split and y-split passes at halving block sizes
//! until single pixels are reached.
//!
//! **[`scheduler`]**: Owns the active run and the adaptive batch-size
//! estimate. Starting a run supersedes the previous one at its next batch
//! boundary.
//!
//! **[`driver`]**: [`Interlacer`](driver::Interlacer), which wires a
//! scheduler to a [`Host`](host::Host) so batches are re-posted to the host's
//! task queue until the run completes.
//!
//! **[`geometry`]**: Grid extents and the [`Block`](geometry::Block)
//! rectangles handed to the sink.
//!
//! **[`sink`]**: The [`BlockSink`](sink::BlockSink) trait consumers implement
//! to draw blocks.
//!
//! **[`host`]**: Clock and task-deferral contract for platform backends.
//!
//! **[`time`]**: Monotonic host time in backend-defined ticks.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and run/batch events.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod driver;
pub mod error;
pub mod geometry;
pub mod host;
pub mod scheduler;
pub mod sink;
pub mod time;
pub mod trace;
pub mod traversal;

#[cfg(test)]
mod testing;

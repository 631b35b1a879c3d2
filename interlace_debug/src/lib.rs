// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, recording, and Chrome trace export for interlace
//! diagnostics.
//!
//! This crate provides [`TraceSink`](interlace_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: one human-readable line per event,
//!   including the per-batch `N in T ms` line.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//!
//! Two sinks can be combined as a tuple `(A, B)`, and a sink wrapped in
//! `Rc<RefCell<_>>` stays readable after it has been handed to a driver.

pub mod chrome;
pub mod pretty;
pub mod recorder;

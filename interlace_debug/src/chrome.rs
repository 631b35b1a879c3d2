// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Batches become complete (`"X"`) slices on one track per run. Run starts
//! and ends carry no timestamp of their own, so they are placed as instant
//! events at the end of the latest batch seen before them.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use interlace_core::time::Timebase;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut cursor_us = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::RunStart(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "RunStart",
                    "cat": "Run",
                    "ts": cursor_us,
                    "pid": 0,
                    "tid": e.run.get(),
                    "s": "t",
                    "args": {
                        "width": e.geometry.width(),
                        "height": e.geometry.height(),
                        "initial_edge": e.initial_edge,
                        "batch_size": e.batch_size,
                    }
                }));
            }
            RecordedEvent::Batch(e) => {
                let ts = ticks_to_us(e.started_at.ticks(), timebase);
                let dur = ticks_to_us(e.elapsed.ticks(), timebase);
                cursor_us = ts + dur;
                events.push(json!({
                    "ph": "X",
                    "name": "Batch",
                    "cat": "Scheduler",
                    "ts": ts,
                    "dur": dur,
                    "pid": 0,
                    "tid": e.run.get(),
                    "args": {
                        "batch_index": e.batch_index,
                        "budget": e.budget,
                        "blocks": e.blocks,
                        "visited": e.visited,
                        "total": e.total,
                        "pass": e.pass.index,
                        "phase": format!("{:?}", e.pass.phase),
                        "next_batch_size": e.next_batch_size,
                    }
                }));
            }
            RecordedEvent::RunEnd(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.reason),
                    "cat": "Run",
                    "ts": cursor_us,
                    "pid": 0,
                    "tid": e.run.get(),
                    "s": "t",
                    "args": {
                        "visited": e.visited,
                        "batches": e.batches,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}

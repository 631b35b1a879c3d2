// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Durations are
//! converted to milliseconds using a [`Timebase`].

use std::io::Write;

use interlace_core::time::Timebase;
use interlace_core::trace::{BatchEvent, RunEndEvent, RunEndReason, RunStartEvent, TraceSink};
use interlace_core::traversal::Phase;

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Coarse => "coarse",
        Phase::XSplit => "x-split",
        Phase::YSplit => "y-split",
    }
}

fn reason_name(reason: RunEndReason) -> &'static str {
    match reason {
        RunEndReason::Completed => "completed",
        RunEndReason::Superseded => "superseded",
        RunEndReason::Cancelled => "cancelled",
        RunEndReason::Failed => "FAILED",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_run_start(&mut self, e: &RunStartEvent) {
        let _ = writeln!(
            self.writer,
            "[run:start] run={} {}x{} edge={} batch={}",
            e.run.get(),
            e.geometry.width(),
            e.geometry.height(),
            e.initial_edge,
            e.batch_size,
        );
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        let _ = writeln!(
            self.writer,
            "[batch] run={} #{} {} in {:.1} ms -> next {} ({} {}x{}, {}/{})",
            e.run.get(),
            e.batch_index,
            e.blocks,
            e.elapsed.to_millis_f64(self.timebase),
            e.next_batch_size,
            phase_name(e.pass.phase),
            e.pass.block_width,
            e.pass.block_height,
            e.visited,
            e.total,
        );
    }

    fn on_run_end(&mut self, e: &RunEndEvent) {
        let _ = writeln!(
            self.writer,
            "[run:end] run={} {} visited={} batches={}",
            e.run.get(),
            reason_name(e.reason),
            e.visited,
            e.batches,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interlace_core::geometry::Geometry;
    use interlace_core::scheduler::{BatchConfig, RunToken, Scheduler};
    use interlace_core::sink::Callbacks;
    use interlace_core::time::{Duration, HostTime};
    use interlace_core::trace::Tracer;
    use interlace_core::traversal::Pass;

    /// A scheduler run whose events land in `sink`; the clock never moves.
    fn run_small(sink: &mut dyn TraceSink) {
        struct Frozen;
        impl interlace_core::host::Clock for Frozen {
            fn now(&self) -> HostTime {
                HostTime(0)
            }
            fn timebase(&self) -> Timebase {
                Timebase::NANOS
            }
        }

        let mut scheduler = Scheduler::new(BatchConfig::interactive());
        let mut tracer = Tracer::new(sink);
        let token = scheduler
            .start(
                Geometry::new(8, 8).unwrap(),
                8,
                Callbacks::new(|_| {}),
                &mut tracer,
            )
            .unwrap();
        while scheduler
            .resume(token, &Frozen, &mut tracer)
            .unwrap()
            .is_pending()
        {}
    }

    #[test]
    fn batch_line_reports_blocks_and_duration() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::new(1000, 1));
        sink.on_batch(&BatchEvent {
            run: RunToken::from_raw(1),
            batch_index: 3,
            started_at: HostTime(0),
            elapsed: Duration(12_345),
            budget: 1024,
            blocks: 1024,
            visited: 3072,
            total: 4096,
            pass: Pass {
                index: 2,
                phase: Phase::YSplit,
                block_width: 8,
                block_height: 8,
            },
            next_batch_size: 2048,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(
            output.contains("1024 in 12.3 ms -> next 2048"),
            "got: {output}"
        );
        assert!(output.contains("y-split 8x8, 3072/4096"), "got: {output}");
    }

    #[test]
    fn full_run_prints_start_batch_and_end() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        run_small(&mut sink);
        let output = String::from_utf8(sink.into_writer()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3, "got: {output}");
        assert!(lines[0].starts_with("[run:start] run=1 8x8 edge=8"), "got: {output}");
        assert!(lines[1].starts_with("[batch] run=1 #1 64 in 0.0 ms"), "got: {output}");
        assert_eq!(lines[2], "[run:end] run=1 completed visited=64 batches=1");
    }
}

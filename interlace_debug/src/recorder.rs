// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! A truncated or unknown record ends decoding.

use interlace_core::geometry::Geometry;
use interlace_core::scheduler::RunToken;
use interlace_core::time::{Duration, HostTime};
use interlace_core::trace::{BatchEvent, RunEndEvent, RunEndReason, RunStartEvent, TraceSink};
use interlace_core::traversal::{Pass, Phase};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_RUN_START: u8 = 1;
const TAG_BATCH: u8 = 2;
const TAG_RUN_END: u8 = 3;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_pass(&mut self, pass: Pass) {
        self.write_u32(pass.index);
        self.write_u8(match pass.phase {
            Phase::Coarse => 0,
            Phase::XSplit => 1,
            Phase::YSplit => 2,
        });
        self.write_u32(pass.block_width);
        self.write_u32(pass.block_height);
    }

    fn write_reason(&mut self, reason: RunEndReason) {
        self.write_u8(match reason {
            RunEndReason::Completed => 0,
            RunEndReason::Superseded => 1,
            RunEndReason::Cancelled => 2,
            RunEndReason::Failed => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_run_start(&mut self, e: &RunStartEvent) {
        self.write_u8(TAG_RUN_START);
        self.write_u64(e.run.get());
        self.write_u32(e.geometry.width());
        self.write_u32(e.geometry.height());
        self.write_u32(e.initial_edge);
        self.write_u32(e.batch_size);
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        self.write_u8(TAG_BATCH);
        self.write_u64(e.run.get());
        self.write_u32(e.batch_index);
        self.write_u64(e.started_at.ticks());
        self.write_u64(e.elapsed.ticks());
        self.write_u32(e.budget);
        self.write_u32(e.blocks);
        self.write_u64(e.visited);
        self.write_u64(e.total);
        self.write_pass(e.pass);
        self.write_u32(e.next_batch_size);
    }

    fn on_run_end(&mut self, e: &RunEndEvent) {
        self.write_u8(TAG_RUN_END);
        self.write_u64(e.run.get());
        self.write_reason(e.reason);
        self.write_u64(e.visited);
        self.write_u32(e.batches);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// A [`RunStartEvent`].
    RunStart(RunStartEvent),
    /// A [`BatchEvent`].
    Batch(BatchEvent),
    /// A [`RunEndEvent`].
    RunEnd(RunEndEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_pass(&mut self) -> Option<Pass> {
        Some(Pass {
            index: self.read_u32()?,
            phase: match self.read_u8()? {
                0 => Phase::Coarse,
                1 => Phase::XSplit,
                2 => Phase::YSplit,
                _ => return None,
            },
            block_width: self.read_u32()?,
            block_height: self.read_u32()?,
        })
    }

    fn read_reason(&mut self) -> Option<RunEndReason> {
        Some(match self.read_u8()? {
            0 => RunEndReason::Completed,
            1 => RunEndReason::Superseded,
            2 => RunEndReason::Cancelled,
            3 => RunEndReason::Failed,
            _ => return None,
        })
    }

    fn decode_run_start(&mut self) -> Option<RecordedEvent> {
        let run = RunToken::from_raw(self.read_u64()?);
        let width = self.read_u32()?;
        let height = self.read_u32()?;
        Some(RecordedEvent::RunStart(RunStartEvent {
            run,
            geometry: Geometry::new(width, height).ok()?,
            initial_edge: self.read_u32()?,
            batch_size: self.read_u32()?,
        }))
    }

    fn decode_batch(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Batch(BatchEvent {
            run: RunToken::from_raw(self.read_u64()?),
            batch_index: self.read_u32()?,
            started_at: HostTime(self.read_u64()?),
            elapsed: Duration(self.read_u64()?),
            budget: self.read_u32()?,
            blocks: self.read_u32()?,
            visited: self.read_u64()?,
            total: self.read_u64()?,
            pass: self.read_pass()?,
            next_batch_size: self.read_u32()?,
        }))
    }

    fn decode_run_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RunEnd(RunEndEvent {
            run: RunToken::from_raw(self.read_u64()?),
            reason: self.read_reason()?,
            visited: self.read_u64()?,
            batches: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let event = match tag {
            TAG_RUN_START => self.decode_run_start(),
            TAG_BATCH => self.decode_batch(),
            TAG_RUN_END => self.decode_run_end(),
            _ => None,
        };
        if event.is_none() {
            // Resynchronising is impossible without a length prefix.
            self.pos = self.data.len();
        }
        event
    }
}

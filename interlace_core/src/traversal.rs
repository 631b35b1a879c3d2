// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interlaced block-sequence generation.
//!
//! [`Traversal`] visits a grid in passes of decreasing block size, similar to
//! classic interlaced image formats:
//!
//! ```text
//!   edge 4, 8x8 grid          coarse     x-split    y-split
//!   A . x . A . x .           A = 4x4    x = 2x4    y = 2x2
//!   . . . . . . . .
//!   y . y . y . y .
//!   . . . . . . . .
//!   A . x . A . x .
//!   ...
//! ```
//!
//! The first pass steps across the grid by the initial edge and emits square
//! blocks of that size. Each later level is split into two passes:
//!
//! - **x-split**: same row step, half-width blocks starting half a block to
//!   the right, filling the columns between the previous level's blocks.
//! - **y-split**: half-height blocks on every half-width column, starting half
//!   a block down, filling the rows in between.
//!
//! The sequence ends after the y-split pass that emits single pixels (or
//! after the coarse pass when the initial edge is 1).
//!
//! Every grid coordinate is the top-left corner of exactly one emitted block,
//! so a run over a `w × h` grid emits exactly `w * h` blocks. Blocks whose
//! corner would lie outside the grid are never emitted; passes that start
//! outside the grid are skipped.

use core::iter::FusedIterator;

use crate::error::InterlaceError;
use crate::geometry::{Block, Geometry};

/// Initial block edge used when the caller has no preference.
pub const DEFAULT_BLOCK_EDGE: u32 = 16;

/// Which kind of pass the traversal is emitting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Full lattice at the initial edge.
    Coarse,
    /// Half-width blocks between the previous level's columns.
    XSplit,
    /// Half-height blocks between the previous level's rows.
    YSplit,
}

/// The pass the traversal is currently emitting blocks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pass {
    /// Zero-based pass counter, including skipped passes.
    pub index: u32,
    /// Kind of pass.
    pub phase: Phase,
    /// Width of every block in this pass.
    pub block_width: u32,
    /// Height of every block in this pass.
    pub block_height: u32,
}

/// Deterministic interlaced block generator.
///
/// Implements [`Iterator`] over [`Block`]s. [`is_complete`](Self::is_complete)
/// turns `true` as soon as the final block has been yielded, so a caller can
/// signal completion without polling for a trailing `None`.
#[derive(Clone, Debug)]
pub struct Traversal {
    geometry: Geometry,
    x: u32,
    y: u32,
    x0: u32,
    y0: u32,
    // Emitted block size.
    dx: u32,
    dy: u32,
    // Lattice step.
    sx: u32,
    sy: u32,
    phase: Phase,
    pass_index: u32,
    visited: u64,
    done: bool,
}

impl Traversal {
    /// Creates a traversal starting at the coarse pass with `initial_edge`
    /// sized blocks.
    ///
    /// `initial_edge` must be a non-zero power of two. It may exceed the grid;
    /// the first blocks then overhang it.
    pub fn new(geometry: Geometry, initial_edge: u32) -> Result<Self, InterlaceError> {
        if !initial_edge.is_power_of_two() {
            return Err(InterlaceError::BlockEdgeNotPowerOfTwo(initial_edge));
        }
        Ok(Self {
            geometry,
            x: 0,
            y: 0,
            x0: 0,
            y0: 0,
            dx: initial_edge,
            dy: initial_edge,
            sx: initial_edge,
            sy: initial_edge,
            phase: Phase::Coarse,
            pass_index: 0,
            visited: 0,
            done: false,
        })
    }

    /// The grid being traversed.
    #[must_use]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Returns `true` once the final block has been yielded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.done
    }

    /// The pass the next block belongs to (or the last pass, once complete).
    #[must_use]
    pub fn pass(&self) -> Pass {
        Pass {
            index: self.pass_index,
            phase: self.phase,
            block_width: self.dx,
            block_height: self.dy,
        }
    }

    /// Blocks yielded so far.
    #[must_use]
    pub fn visited(&self) -> u64 {
        self.visited
    }

    /// Total number of blocks the traversal yields.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.geometry.area()
    }

    fn advance(&mut self) {
        self.x = self.x.saturating_add(self.sx);
        if self.x < self.geometry.width() {
            return;
        }
        self.x = self.x0;
        self.y = self.y.saturating_add(self.sy);
        if self.y < self.geometry.height() {
            return;
        }
        self.next_pass();
    }

    fn next_pass(&mut self) {
        loop {
            if self.dy <= 1 {
                self.done = true;
                return;
            }
            if self.dx == self.dy {
                self.sx = self.dx;
                self.dx /= 2;
                self.x0 = self.dx;
                self.sy = self.dy;
                self.y0 = 0;
                self.phase = Phase::XSplit;
            } else {
                self.sy = self.dy;
                self.dy /= 2;
                self.y0 = self.dy;
                self.sx /= 2;
                self.x0 = 0;
                self.phase = Phase::YSplit;
            }
            self.pass_index += 1;
            self.x = self.x0;
            self.y = self.y0;
            if self.geometry.contains(self.x0, self.y0) {
                return;
            }
        }
    }
}

impl Iterator for Traversal {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if self.done {
            return None;
        }
        let block = Block::new(self.x, self.y, self.dx, self.dy);
        self.visited += 1;
        self.advance();
        Some(block)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total() - self.visited;
        match usize::try_from(remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl FusedIterator for Traversal {}

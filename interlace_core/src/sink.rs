// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Block consumers.
//!
//! A [`BlockSink`] receives every block of a run, synchronously and in
//! traversal order, and is told once when the run completes. Drawing,
//! clipping to the grid, and color computation all live on the sink side.

use alloc::boxed::Box;
use core::convert::Infallible;
use core::fmt;

use crate::geometry::Block;

/// Consumes the blocks produced by a run.
pub trait BlockSink {
    /// Error returned by [`fill`](Self::fill). Any error aborts the run.
    type Error;

    /// Fills one block. Blocks may overhang the grid; clip while drawing.
    fn fill(&mut self, block: Block) -> Result<(), Self::Error>;

    /// Called once, after the final block of a run that was not superseded,
    /// cancelled, or aborted.
    fn complete(&mut self) {}
}

impl<S: BlockSink + ?Sized> BlockSink for Box<S> {
    type Error = S::Error;

    fn fill(&mut self, block: Block) -> Result<(), Self::Error> {
        (**self).fill(block)
    }

    fn complete(&mut self) {
        (**self).complete();
    }
}

/// Adapts a block closure and an optional completion closure into a
/// [`BlockSink`].
///
/// ```rust
/// use interlace_core::sink::Callbacks;
///
/// let sink = Callbacks::new(|block| {
///     let _ = (block.x, block.y, block.width, block.height);
/// })
/// .on_complete(|| {});
/// # let _ = sink;
/// ```
pub struct Callbacks<F> {
    on_block: F,
    on_complete: Option<Box<dyn FnOnce()>>,
}

impl<F: FnMut(Block)> Callbacks<F> {
    /// Wraps `on_block`, which is invoked once per visited block.
    pub fn new(on_block: F) -> Self {
        Self {
            on_block,
            on_complete: None,
        }
    }

    /// Sets the closure invoked when the run completes.
    #[must_use]
    pub fn on_complete(mut self, on_complete: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(on_complete));
        self
    }
}

impl<F: FnMut(Block)> BlockSink for Callbacks<F> {
    type Error = Infallible;

    fn fill(&mut self, block: Block) -> Result<(), Infallible> {
        (self.on_block)(block);
        Ok(())
    }

    fn complete(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
    }
}

impl<F> fmt::Debug for Callbacks<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_complete", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

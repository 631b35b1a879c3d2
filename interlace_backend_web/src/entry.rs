// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JavaScript-facing entry points.
//!
//! ```js
//! import { interlace } from "./interlace_backend_web.js";
//!
//! interlace(canvas.width, canvas.height, (x, y, w, h) => {
//!     ctx.fillStyle = colorAt(x, y);
//!     ctx.fillRect(x, y, w, h);
//! }, () => console.log("done"), 16);
//! ```
//!
//! [`interlace`] shares one page-wide [`Interlace`] instance, so a new call
//! abandons the previous image. Construct separate [`Interlace`] objects to
//! render several images concurrently.

use std::cell::OnceCell;

use js_sys::Function;
use wasm_bindgen::prelude::*;

use interlace_core::driver::Interlacer;
use interlace_core::geometry::{Block, Geometry};
use interlace_core::scheduler::{BatchConfig, RunToken};
use interlace_core::sink::BlockSink;
use interlace_core::traversal::DEFAULT_BLOCK_EDGE;

use crate::timer::{WebHost, console_error};

/// Calls `onBlock(x, y, width, height)` per block and `onComplete()` at the
/// end. A throwing `onBlock` aborts the run; the exception is logged to the
/// console.
struct JsSink {
    on_block: Function,
    on_complete: Option<Function>,
}

impl BlockSink for JsSink {
    type Error = JsValue;

    fn fill(&mut self, block: Block) -> Result<(), JsValue> {
        self.on_block
            .call4(
                &JsValue::NULL,
                &JsValue::from(block.x),
                &JsValue::from(block.y),
                &JsValue::from(block.width),
                &JsValue::from(block.height),
            )
            .map(drop)
            .inspect_err(console_error)
    }

    fn complete(&mut self) {
        if let Some(on_complete) = self.on_complete.take()
            && let Err(error) = on_complete.call0(&JsValue::NULL)
        {
            console_error(&error);
        }
    }
}

/// Converts a run token to a JS number. Tokens stay far below 2^53.
fn token_to_js(token: RunToken) -> f64 {
    token.get() as f64
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "non-integral or negative handles never match a run"
)]
fn token_from_js(handle: f64) -> RunToken {
    RunToken::from_raw(handle as u64)
}

/// A progressive renderer driven by the browser task queue.
#[wasm_bindgen]
pub struct Interlace {
    inner: Interlacer<WebHost, JsSink>,
}

#[wasm_bindgen]
impl Interlace {
    /// Creates a renderer tuned for 100–200 ms batches.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BatchConfig::interactive())
    }

    /// Creates a renderer tuned for 8–16 ms batches that also yields after
    /// every refinement pass.
    #[wasm_bindgen(js_name = "frameBudget")]
    #[must_use]
    pub fn frame_budget() -> Self {
        Self::with_config(BatchConfig::frame_budget())
    }

    /// Starts rendering a `width` × `height` image, abandoning any render
    /// in progress. Returns a handle for [`cancel`](Self::cancel).
    ///
    /// The first batch runs before this returns.
    pub fn start(
        &self,
        width: u32,
        height: u32,
        on_block: Function,
        on_complete: Option<Function>,
        initial_block_edge: Option<u32>,
    ) -> Result<f64, JsValue> {
        let geometry =
            Geometry::new(width, height).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let sink = JsSink {
            on_block,
            on_complete,
        };
        let token = self
            .inner
            .start(
                geometry,
                initial_block_edge.unwrap_or(DEFAULT_BLOCK_EDGE),
                sink,
            )
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(token_to_js(token))
    }

    /// Stops the render identified by `handle`. Returns whether it was live.
    pub fn cancel(&self, handle: f64) -> bool {
        self.inner.cancel(token_from_js(handle))
    }

    /// Returns `true` while the render identified by `handle` is live.
    #[wasm_bindgen(js_name = "isRunning")]
    #[must_use]
    pub fn is_running(&self, handle: f64) -> bool {
        self.inner.is_running(token_from_js(handle))
    }

    /// Takes the exception that aborted the most recent failed render, or
    /// `undefined`.
    #[wasm_bindgen(js_name = "takeFailure")]
    pub fn take_failure(&self) -> JsValue {
        self.inner
            .take_failure()
            .map_or(JsValue::UNDEFINED, |failure| failure.error)
    }

    /// The current number of blocks per batch.
    #[wasm_bindgen(getter, js_name = "batchSize")]
    #[must_use]
    pub fn batch_size(&self) -> u32 {
        self.inner.batch_size()
    }
}

impl Interlace {
    fn with_config(config: BatchConfig) -> Self {
        Self {
            inner: Interlacer::new(WebHost, config),
        }
    }
}

impl Default for Interlace {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Interlace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Interlace")
            .field("batch_size", &self.inner.batch_size())
            .finish_non_exhaustive()
    }
}

thread_local! {
    static SHARED: OnceCell<Interlace> = const { OnceCell::new() };
}

/// Renders `width` × `height` progressively, calling
/// `onBlock(x, y, width, height)` for every block and `onComplete()` once the
/// finest pass is done.
///
/// Only one image renders at a time: calling `interlace` again abandons the
/// previous render at its next batch boundary. `initialBlockEdge` defaults
/// to 16 and must be a power of two.
#[wasm_bindgen]
pub fn interlace(
    width: u32,
    height: u32,
    on_block: Function,
    on_complete: Option<Function>,
    initial_block_edge: Option<u32>,
) -> Result<f64, JsValue> {
    SHARED.with(|shared| {
        shared.get_or_init(Interlace::new).start(
            width,
            height,
            on_block,
            on_complete,
            initial_block_edge,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_survive_the_js_number_round_trip() {
        let token = RunToken::from_raw(42);
        assert_eq!(token_from_js(token_to_js(token)), token);
    }

    #[test]
    fn junk_handles_map_to_no_run() {
        assert_eq!(token_from_js(-1.0).get(), 0);
        assert_eq!(token_from_js(f64::NAN).get(), 0);
    }
}

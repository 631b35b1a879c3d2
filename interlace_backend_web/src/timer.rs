// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser clock and macrotask bindings.
//!
//! [`WebHost`] reads `performance.now()` (milliseconds, converted to
//! microsecond [`HostTime`] ticks) and defers tasks with `setTimeout(.., 0)`,
//! which queues them behind pending input and rendering work.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use interlace_core::host::{Clock, Host};
use interlace_core::time::{HostTime, Timebase};

// Direct global bindings instead of `web_sys::Window` methods. These also
// resolve inside workers, where there is no `window`.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(handler: &JsValue, timeout: i32) -> JsValue;

    #[wasm_bindgen(js_namespace = console, js_name = "error")]
    pub(crate) fn console_error(value: &JsValue);
}

/// Converts a `performance.now()` reading to microsecond ticks.
pub(crate) fn millis_to_host_time(ms: f64) -> HostTime {
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "performance.now() returns small positive f64; µs fits in u64"
    )]
    let us = (ms * 1000.0) as u64;
    HostTime(us)
}

/// The browser host: `performance.now()` clock and `setTimeout` deferral.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebHost;

impl Clock for WebHost {
    fn now(&self) -> HostTime {
        crate::now()
    }

    fn timebase(&self) -> Timebase {
        crate::timebase()
    }
}

impl Host for WebHost {
    fn defer(&self, task: Box<dyn FnOnce()>) {
        let handler = Closure::once_into_js(move || task());
        set_timeout(&handler, 0);
    }
}

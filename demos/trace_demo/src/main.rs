// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Progressive render that exercises the tracing and diagnostics pipeline.
//!
//! Renders a Mandelbrot set into an in-memory greyscale image through the
//! std host, printing every run and batch with a
//! [`PrettyPrintSink`](interlace_debug::pretty::PrettyPrintSink) and recording
//! them with a [`RecorderSink`](interlace_debug::recorder::RecorderSink).
//! A first, larger render is abandoned after a few batches to show
//! supersession. Finishes by printing an ASCII preview and exporting a Chrome
//! trace JSON file.

use std::cell::RefCell;
use std::convert::Infallible;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use interlace_backend_std::StdHost;
use interlace_core::driver::Interlacer;
use interlace_core::geometry::{Block, Geometry};
use interlace_core::scheduler::BatchConfig;
use interlace_core::sink::BlockSink;
use interlace_core::traversal::DEFAULT_BLOCK_EDGE;

use interlace_debug::pretty::PrettyPrintSink;
use interlace_debug::recorder::RecorderSink;

const WIDTH: u32 = 480;
const HEIGHT: u32 = 320;
const MAX_ITERATIONS: u32 = 256;
/// Host tasks drained before the first render is replaced.
const BATCHES_BEFORE_RESTART: usize = 3;

/// Greyscale image shared between the sink and `main`.
type Pixels = Rc<RefCell<Vec<u8>>>;

/// Fills each block with the escape-time shade of its top-left pixel.
struct MandelbrotSink {
    geometry: Geometry,
    pixels: Pixels,
}

impl MandelbrotSink {
    fn shade(&self, x: u32, y: u32) -> u8 {
        let cx = -2.2 + 3.2 * f64::from(x) / f64::from(self.geometry.width());
        let cy = -1.2 + 2.4 * f64::from(y) / f64::from(self.geometry.height());
        let (mut zx, mut zy) = (0.0_f64, 0.0_f64);
        let mut i = 0;
        while i < MAX_ITERATIONS && zx * zx + zy * zy <= 4.0 {
            (zx, zy) = (zx * zx - zy * zy + cx, 2.0 * zx * zy + cy);
            i += 1;
        }
        u8::try_from(i * 255 / MAX_ITERATIONS).unwrap_or(u8::MAX)
    }
}

impl BlockSink for MandelbrotSink {
    type Error = Infallible;

    fn fill(&mut self, block: Block) -> Result<(), Infallible> {
        let Some(clipped) = block.clip_to(self.geometry) else {
            return Ok(());
        };
        let shade = self.shade(block.x, block.y);
        let stride = self.geometry.width() as usize;
        let mut pixels = self.pixels.borrow_mut();
        for y in clipped.y..clipped.bottom() {
            let row = y as usize * stride;
            pixels[row + clipped.x as usize..row + clipped.right() as usize].fill(shade);
        }
        Ok(())
    }
}

fn main() {
    let host = Rc::new(StdHost::new());
    let timebase = interlace_backend_std::timebase();

    // -- sinks -------------------------------------------------------------
    let pretty = PrettyPrintSink::new(Box::new(std::io::stdout()), timebase);
    let recorder = Rc::new(RefCell::new(RecorderSink::new()));

    // -- driver ------------------------------------------------------------
    let config = BatchConfig {
        initial_batch: 256,
        ..BatchConfig::frame_budget()
    };
    let interlacer = Interlacer::new(Rc::clone(&host), config);
    interlacer.set_trace_sink(Some(Box::new((pretty, Rc::clone(&recorder)))));

    // -- an abandoned render -----------------------------------------------
    let big = Geometry::new(WIDTH * 2, HEIGHT * 2).expect("demo geometry is non-empty");
    let discarded: Pixels = Rc::new(RefCell::new(vec![0; (WIDTH * HEIGHT * 4) as usize]));
    interlacer
        .start(
            big,
            DEFAULT_BLOCK_EDGE,
            MandelbrotSink {
                geometry: big,
                pixels: discarded,
            },
        )
        .expect("default block edge is a power of two");
    for _ in 0..BATCHES_BEFORE_RESTART {
        host.run_next();
    }

    // -- the render we keep ------------------------------------------------
    let geometry = Geometry::new(WIDTH, HEIGHT).expect("demo geometry is non-empty");
    let pixels: Pixels = Rc::new(RefCell::new(vec![0; (WIDTH * HEIGHT) as usize]));
    let token = interlacer
        .start(
            geometry,
            DEFAULT_BLOCK_EDGE,
            MandelbrotSink {
                geometry,
                pixels: Rc::clone(&pixels),
            },
        )
        .expect("default block edge is a power of two");
    let ran = host.run_until_idle();
    assert!(!interlacer.is_running(token), "render finished");
    println!("Drained {ran} host tasks; final batch size {}", interlacer.batch_size());

    print_preview(&pixels.borrow(), geometry);

    // -- export Chrome trace -----------------------------------------------
    interlacer.set_trace_sink(None);
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    interlace_debug::chrome::export(recorder.borrow().as_bytes(), timebase, &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path}");
}

/// Prints a downsampled ASCII rendition of `pixels`.
fn print_preview(pixels: &[u8], geometry: Geometry) {
    const RAMP: &[u8] = b" .:-=+*#%@";
    const COLUMNS: u32 = 80;
    let step_x = geometry.width().div_ceil(COLUMNS);
    // Terminal cells are roughly twice as tall as wide.
    let step_y = step_x * 2;
    let stride = geometry.width() as usize;

    for y in (0..geometry.height()).step_by(step_y as usize) {
        let line: String = (0..geometry.width())
            .step_by(step_x as usize)
            .map(|x| {
                let shade = pixels[y as usize * stride + x as usize] as usize;
                RAMP[shade * (RAMP.len() - 1) / 255] as char
            })
            .collect();
        println!("{line}");
    }
}

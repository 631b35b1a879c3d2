// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles: a hand-advanced clock, a recording sink, and a FIFO host.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell};

use crate::geometry::Block;
use crate::host::{Clock, Host};
use crate::sink::BlockSink;
use crate::time::{HostTime, Timebase};

/// Nanosecond clock that only moves when told to.
#[derive(Debug, Default)]
pub(crate) struct ManualClock {
    ticks: Cell<u64>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn advance(&self, nanos: u64) {
        self.ticks.set(self.ticks.get() + nanos);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> HostTime {
        HostTime(self.ticks.get())
    }

    fn timebase(&self) -> Timebase {
        Timebase::NANOS
    }
}

/// Shared log of everything the sinks created from it saw.
#[derive(Clone, Debug, Default)]
pub(crate) struct Recording {
    blocks: Rc<RefCell<Vec<Block>>>,
    completions: Rc<Cell<u32>>,
}

impl Recording {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn sink(&self) -> RecordingSink {
        RecordingSink {
            log: self.clone(),
            cost: None,
            fail_at: None,
        }
    }

    pub(crate) fn blocks(&self) -> Ref<'_, Vec<Block>> {
        self.blocks.borrow()
    }

    pub(crate) fn completions(&self) -> u32 {
        self.completions.get()
    }
}

/// Records blocks; optionally burns simulated time per block or fails.
#[derive(Debug)]
pub(crate) struct RecordingSink {
    log: Recording,
    cost: Option<(Rc<ManualClock>, u64)>,
    fail_at: Option<usize>,
}

impl RecordingSink {
    /// Advances `clock` by `nanos` for every block.
    pub(crate) fn with_cost(mut self, clock: Rc<ManualClock>, nanos: u64) -> Self {
        self.cost = Some((clock, nanos));
        self
    }

    /// Fails on the `n`th block (1-based) this recording has seen.
    pub(crate) fn fail_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }
}

impl BlockSink for RecordingSink {
    type Error = &'static str;

    fn fill(&mut self, block: Block) -> Result<(), Self::Error> {
        if let Some((clock, nanos)) = &self.cost {
            clock.advance(*nanos);
        }
        let mut blocks = self.log.blocks.borrow_mut();
        blocks.push(block);
        if self.fail_at == Some(blocks.len()) {
            return Err("sink failed");
        }
        Ok(())
    }

    fn complete(&mut self) {
        self.log.completions.set(self.log.completions.get() + 1);
    }
}

/// A host whose task queue the test drains by hand.
#[derive(Default)]
pub(crate) struct TestHost {
    clock: ManualClock,
    queue: RefCell<VecDeque<Box<dyn FnOnce()>>>,
}

impl TestHost {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Runs the oldest queued task. Returns `false` if the queue was empty.
    pub(crate) fn run_next(&self) -> bool {
        let task = self.queue.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs tasks until the queue is empty, returning how many ran.
    pub(crate) fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl core::fmt::Debug for TestHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TestHost")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl Clock for TestHost {
    fn now(&self) -> HostTime {
        self.clock.now()
    }

    fn timebase(&self) -> Timebase {
        self.clock.timebase()
    }
}

impl Host for TestHost {
    fn defer(&self, task: Box<dyn FnOnce()>) {
        self.queue.borrow_mut().push_back(task);
    }
}

// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-threaded FIFO task queue.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

type Task = Box<dyn FnOnce()>;

/// Unbounded FIFO of deferred tasks.
///
/// Tasks may push more tasks while they run; those land behind everything
/// already queued.
#[derive(Default)]
pub(crate) struct TaskQueue {
    tasks: RefCell<VecDeque<Task>>,
    executed: Cell<u64>,
}

impl TaskQueue {
    pub(crate) fn push(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }

    /// Pops and runs the oldest task. The queue is not borrowed while it runs.
    pub(crate) fn run_next(&self) -> bool {
        let task = self.tasks.borrow_mut().pop_front();
        let Some(task) = task else {
            return false;
        };
        task();
        self.executed.set(self.executed.get() + 1);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub(crate) fn executed(&self) -> u64 {
        self.executed.get()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.len())
            .field("executed", &self.executed())
            .finish_non_exhaustive()
    }
}

// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batch scheduling with an adaptive batch size and run supersession.
//!
//! The [`Scheduler`] owns at most one live run. Each activation fills up to
//! [`Scheduler::batch_size`] blocks, measures how long that took, and retunes
//! the batch size so batches land in the configured wall-clock band. Starting
//! a new run retires the previous one; a stale continuation that still holds
//! the old [`RunToken`] finds nothing to do at its next batch boundary.
//!
//! # Usage
//!
//! ```rust,ignore
//! let token = scheduler.start(geometry, DEFAULT_BLOCK_EDGE, sink, &mut tracer)?;
//! while scheduler.resume(token, &clock, &mut tracer)?.is_pending() {
//!     // yield to the host
//! }
//! ```
//!
//! Drivers that must not keep the scheduler borrowed while sink callbacks run
//! use the split form: [`Scheduler::checkout`], [`Batch::execute`], then
//! [`Scheduler::settle`]. A run that completed leaves its sink in
//! [`Scheduler::take_completed`], to be told once the borrow is released.

use core::fmt;

use crate::error::{InterlaceError, RunFailure};
use crate::geometry::Geometry;
use crate::host::Clock;
use crate::sink::BlockSink;
use crate::time::{Duration, HostTime};
use crate::trace::{BatchEvent, RunEndEvent, RunEndReason, RunStartEvent, Tracer};
use crate::traversal::Traversal;

/// Configuration for the [`Scheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Batch size used before any batch has been measured.
    pub initial_batch: u32,
    /// Lower bound of the batch-size estimate.
    pub min_batch: u32,
    /// Upper bound of the batch-size estimate.
    pub max_batch: u32,
    /// Batches faster than this double the estimate.
    pub target_floor_nanos: u64,
    /// Batches slower than this halve the estimate.
    pub target_ceiling_nanos: u64,
    /// End a batch early whenever a pass finishes, so the host can present
    /// each intermediate resolution.
    pub yield_on_pass_end: bool,
}

impl BatchConfig {
    /// Background rendering on a UI thread: batches of 100–200 ms.
    #[must_use]
    pub const fn interactive() -> Self {
        Self {
            initial_batch: 1 << 10,
            min_batch: 1 << 6,
            max_batch: 1 << 20,
            target_floor_nanos: 100_000_000,
            target_ceiling_nanos: 200_000_000,
            yield_on_pass_end: false,
        }
    }

    /// Rendering interleaved with animation frames: batches of 8–16 ms, and
    /// every finished pass is presented.
    #[must_use]
    pub const fn frame_budget() -> Self {
        Self {
            initial_batch: 1 << 8,
            min_batch: 1 << 4,
            max_batch: 1 << 20,
            target_floor_nanos: 8_000_000,
            target_ceiling_nanos: 16_000_000,
            yield_on_pass_end: true,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Self-tuning number of blocks per batch.
///
/// Halves after a batch slower than the ceiling, doubles after a batch faster
/// than the floor, always staying within `[min_batch, max_batch]`. Batch
/// times are truncated to whole milliseconds before the comparison, so a
/// 200.4 ms batch sits on a 200 ms ceiling rather than above it.
#[derive(Clone, Copy, Debug)]
pub struct BatchSizer {
    size: u32,
    min: u32,
    max: u32,
    floor_nanos: u64,
    ceiling_nanos: u64,
}

impl BatchSizer {
    /// Creates a sizer starting at `config.initial_batch`.
    #[must_use]
    pub fn new(config: &BatchConfig) -> Self {
        let min = config.min_batch.max(1);
        let max = config.max_batch.max(min);
        Self {
            size: config.initial_batch.max(min).min(max),
            min,
            max,
            floor_nanos: config.target_floor_nanos,
            ceiling_nanos: config.target_ceiling_nanos,
        }
    }

    /// Current estimate.
    #[must_use]
    pub fn get(&self) -> u32 {
        self.size
    }

    /// Feeds the duration of a batch that used the whole estimate and returns
    /// the new estimate.
    pub fn observe(&mut self, elapsed_nanos: u64) -> u32 {
        let elapsed_nanos = elapsed_nanos - elapsed_nanos % NANOS_PER_MILLI;
        if elapsed_nanos > self.ceiling_nanos && self.size > self.min {
            self.size = (self.size / 2).max(self.min);
        } else if elapsed_nanos < self.floor_nanos && self.size < self.max {
            self.size = self.size.saturating_mul(2).min(self.max);
        }
        self.size
    }
}

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Identifies one run started on a [`Scheduler`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunToken(u64);

impl RunToken {
    /// Rebuilds a token from its raw run number, e.g. when replaying a
    /// recorded trace.
    ///
    /// A rebuilt token only refers to a live run if it came from the same
    /// scheduler.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw run number. Runs are numbered from 1 per scheduler.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RunToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RunToken({})", self.0)
    }
}

/// Result of one scheduler activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The batch ended with blocks left; schedule another activation.
    Yielded {
        /// Blocks filled in this batch.
        blocks: u32,
    },
    /// The final block was filled in this batch.
    Completed {
        /// Blocks filled in this batch.
        blocks: u32,
    },
    /// The run is no longer live. From [`Scheduler::resume`] this means
    /// nothing was filled; from [`Scheduler::settle`] the batch may have run
    /// before the run was retired, and its sink is never told it completed.
    Superseded,
}

impl BatchOutcome {
    /// Returns `true` if the run wants another activation.
    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Yielded { .. })
    }
}

/// Progress of the live run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// The live run.
    pub run: RunToken,
    /// Blocks filled so far.
    pub visited: u64,
    /// Blocks the run fills in total.
    pub total: u64,
    /// Batches executed so far.
    pub batches: u32,
}

struct Run<S> {
    token: RunToken,
    traversal: Traversal,
    sink: S,
    batches: u32,
}

/// A batch checked out of a [`Scheduler`], ready to execute.
///
/// Holds the run's state while it executes, so the scheduler itself can be
/// used (for example to start a new run) from inside sink callbacks.
#[must_use = "a checked-out batch holds its run until it is settled"]
pub struct Batch<S> {
    run: Run<S>,
    budget: u32,
    yield_on_pass_end: bool,
}

enum BatchEnd<E> {
    BudgetSpent,
    PassEnd,
    Completed,
    Failed(E),
}

/// A batch that has run and must be handed back with [`Scheduler::settle`].
#[must_use = "an executed batch must be settled to retune and reschedule the run"]
pub struct ExecutedBatch<S: BlockSink> {
    run: Run<S>,
    budget: u32,
    blocks: u32,
    started_at: HostTime,
    elapsed: Duration,
    elapsed_nanos: u64,
    end: BatchEnd<S::Error>,
}

impl<S: BlockSink> Batch<S> {
    /// The run this batch belongs to.
    #[must_use]
    pub fn token(&self) -> RunToken {
        self.run.token
    }

    /// Maximum number of blocks this batch fills.
    #[must_use]
    pub fn budget(&self) -> u32 {
        self.budget
    }

    /// Fills up to [`budget`](Self::budget) blocks, timing the batch with
    /// `clock`.
    ///
    /// Stops early when the traversal completes, when the sink fails, or at
    /// the end of a pass if the scheduler was configured to yield there. The
    /// sink is not told about completion here; see [`Scheduler::settle`].
    pub fn execute(mut self, clock: &dyn Clock) -> ExecutedBatch<S> {
        let started_at = clock.now();
        let pass = self.run.traversal.pass().index;
        let mut blocks = 0_u32;
        let mut end = BatchEnd::BudgetSpent;

        while blocks < self.budget {
            let Some(block) = self.run.traversal.next() else {
                end = BatchEnd::Completed;
                break;
            };
            blocks += 1;
            if let Err(error) = self.run.sink.fill(block) {
                end = BatchEnd::Failed(error);
                break;
            }
            if self.run.traversal.is_complete() {
                end = BatchEnd::Completed;
                break;
            }
            if self.yield_on_pass_end && self.run.traversal.pass().index != pass {
                end = BatchEnd::PassEnd;
                break;
            }
        }

        let elapsed = clock.now().saturating_duration_since(started_at);
        self.run.batches += 1;
        ExecutedBatch {
            elapsed_nanos: elapsed.to_nanos(clock.timebase()),
            run: self.run,
            budget: self.budget,
            blocks,
            started_at,
            elapsed,
            end,
        }
    }
}

impl<S: BlockSink> ExecutedBatch<S> {
    /// The run this batch belonged to.
    #[must_use]
    pub fn token(&self) -> RunToken {
        self.run.token
    }

    /// Blocks filled.
    #[must_use]
    pub fn blocks(&self) -> u32 {
        self.blocks
    }

    /// Time spent in the batch.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Drives interlaced runs in time-bounded batches.
///
/// See the [module docs](self) for the activation cycle.
pub struct Scheduler<S> {
    config: BatchConfig,
    sizer: BatchSizer,
    live: Option<Progress>,
    parked: Option<Run<S>>,
    completed: Option<S>,
    runs_started: u64,
}

impl<S: BlockSink> Scheduler<S> {
    /// Creates a scheduler with no live run.
    #[must_use]
    pub fn new(config: BatchConfig) -> Self {
        Self {
            sizer: BatchSizer::new(&config),
            config,
            live: None,
            parked: None,
            completed: None,
            runs_started: 0,
        }
    }

    /// The configuration this scheduler was created with.
    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Current batch-size estimate. Carried over from run to run.
    #[must_use]
    pub fn batch_size(&self) -> u32 {
        self.sizer.get()
    }

    /// The live run, if any.
    #[must_use]
    pub fn active(&self) -> Option<RunToken> {
        self.live.map(|p| p.run)
    }

    /// Returns `true` if `token` is the live run.
    #[must_use]
    pub fn is_active(&self, token: RunToken) -> bool {
        self.active() == Some(token)
    }

    /// Progress of the live run, if any.
    #[must_use]
    pub fn progress(&self) -> Option<Progress> {
        self.live
    }

    /// Starts a run over `geometry` with coarse blocks of `initial_edge`
    /// pixels, retiring any live run.
    ///
    /// No blocks are filled until the first [`resume`](Self::resume) or
    /// [`checkout`](Self::checkout). On error the live run is left untouched.
    pub fn start(
        &mut self,
        geometry: Geometry,
        initial_edge: u32,
        sink: S,
        tracer: &mut Tracer<'_>,
    ) -> Result<RunToken, InterlaceError> {
        let traversal = Traversal::new(geometry, initial_edge)?;
        self.retire(RunEndReason::Superseded, tracer);

        self.runs_started += 1;
        let token = RunToken(self.runs_started);
        self.live = Some(Progress {
            run: token,
            visited: 0,
            total: traversal.total(),
            batches: 0,
        });
        self.parked = Some(Run {
            token,
            traversal,
            sink,
            batches: 0,
        });
        tracer.run_start(&RunStartEvent {
            run: token,
            geometry,
            initial_edge,
            batch_size: self.sizer.get(),
        });
        Ok(token)
    }

    /// Cancels `token` if it is the live run. Returns whether it was.
    ///
    /// A batch already executing for the run still runs to its end.
    pub fn cancel(&mut self, token: RunToken, tracer: &mut Tracer<'_>) -> bool {
        if !self.is_active(token) {
            return false;
        }
        self.retire(RunEndReason::Cancelled, tracer);
        true
    }

    /// Runs one batch of `token`.
    ///
    /// Returns [`BatchOutcome::Superseded`] without touching the sink if
    /// `token` is not the live run.
    pub fn resume(
        &mut self,
        token: RunToken,
        clock: &dyn Clock,
        tracer: &mut Tracer<'_>,
    ) -> Result<BatchOutcome, RunFailure<S::Error>> {
        let Some(batch) = self.checkout(token) else {
            return Ok(BatchOutcome::Superseded);
        };
        let executed = batch.execute(clock);
        let outcome = self.settle(executed, tracer)?;
        if let Some(mut sink) = self.take_completed() {
            sink.complete();
        }
        Ok(outcome)
    }

    /// Takes the next batch of `token` out of the scheduler.
    ///
    /// Returns `None` if `token` is not the live run, or if its batch is
    /// already checked out.
    pub fn checkout(&mut self, token: RunToken) -> Option<Batch<S>> {
        if !self.is_active(token) || self.parked.as_ref().map(|r| r.token) != Some(token) {
            return None;
        }
        let run = self.parked.take()?;
        Some(Batch {
            run,
            budget: self.sizer.get(),
            yield_on_pass_end: self.config.yield_on_pass_end,
        })
    }

    /// Hands an executed batch back: retunes the batch size, records
    /// progress, and parks the run again if it is still live and unfinished.
    ///
    /// A batch whose run was superseded or cancelled while it executed settles
    /// as [`BatchOutcome::Superseded`], even if it filled the final block. When
    /// a live run completes, its sink is held for [`take_completed`]
    /// instead of being told here, so that
    /// [`BlockSink::complete`] can run without the scheduler borrowed.
    ///
    /// [`take_completed`]: Self::take_completed
    pub fn settle(
        &mut self,
        executed: ExecutedBatch<S>,
        tracer: &mut Tracer<'_>,
    ) -> Result<BatchOutcome, RunFailure<S::Error>> {
        let ExecutedBatch {
            run,
            budget,
            blocks,
            started_at,
            elapsed,
            elapsed_nanos,
            end,
        } = executed;
        let token = run.token;

        // Short batches (pass end, completion, failure) say little about
        // throughput.
        if matches!(end, BatchEnd::BudgetSpent) {
            self.sizer.observe(elapsed_nanos);
        }

        let visited = run.traversal.visited();
        tracer.batch(&BatchEvent {
            run: token,
            batch_index: run.batches,
            started_at,
            elapsed,
            budget,
            blocks,
            visited,
            total: run.traversal.total(),
            pass: run.traversal.pass(),
            next_batch_size: self.sizer.get(),
        });

        let live = match &mut self.live {
            Some(progress) if progress.run == token => {
                progress.visited = visited;
                progress.batches = run.batches;
                true
            }
            _ => false,
        };

        match end {
            BatchEnd::Failed(error) => {
                if live {
                    self.retire(RunEndReason::Failed, tracer);
                }
                Err(RunFailure {
                    token,
                    visited,
                    error,
                })
            }
            BatchEnd::Completed => {
                if live {
                    self.retire(RunEndReason::Completed, tracer);
                    self.completed = Some(run.sink);
                    Ok(BatchOutcome::Completed { blocks })
                } else {
                    Ok(BatchOutcome::Superseded)
                }
            }
            BatchEnd::BudgetSpent | BatchEnd::PassEnd => {
                if live {
                    self.parked = Some(run);
                    Ok(BatchOutcome::Yielded { blocks })
                } else {
                    Ok(BatchOutcome::Superseded)
                }
            }
        }
    }

    /// Takes the sink of the run that the last [`settle`](Self::settle)
    /// completed.
    ///
    /// Split-form callers call [`BlockSink::complete`] on it once they no
    /// longer hold the scheduler; [`resume`](Self::resume) does this itself.
    pub fn take_completed(&mut self) -> Option<S> {
        self.completed.take()
    }

    fn retire(&mut self, reason: RunEndReason, tracer: &mut Tracer<'_>) {
        let Some(progress) = self.live.take() else {
            return;
        };
        self.parked = None;
        tracer.run_end(&RunEndEvent {
            run: progress.run,
            reason,
            visited: progress.visited,
            batches: progress.batches,
        });
    }
}

impl<S> fmt::Debug for Scheduler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("sizer", &self.sizer)
            .field("live", &self.live)
            .field("parked", &self.parked.is_some())
            .field("completed", &self.completed.is_some())
            .field("runs_started", &self.runs_started)
            .finish()
    }
}

impl<S> fmt::Debug for Batch<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("run", &self.run.token)
            .field("budget", &self.budget)
            .field("yield_on_pass_end", &self.yield_on_pass_end)
            .finish_non_exhaustive()
    }
}

impl<S: BlockSink> fmt::Debug for ExecutedBatch<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutedBatch")
            .field("run", &self.run.token)
            .field("budget", &self.budget)
            .field("blocks", &self.blocks)
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;

    use super::*;
    use crate::geometry::Block;
    use crate::testing::{ManualClock, Recording, RecordingSink};

    const MS: u64 = 1_000_000;

    fn geometry(width: u32, height: u32) -> Geometry {
        Geometry::new(width, height).unwrap()
    }

    fn small_batches() -> BatchConfig {
        BatchConfig {
            initial_batch: 100,
            min_batch: 1,
            ..BatchConfig::interactive()
        }
    }

    /// Resumes `token` until it stops asking for more batches.
    fn drain(
        sched: &mut Scheduler<RecordingSink>,
        token: RunToken,
        clock: &ManualClock,
    ) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let outcome = sched.resume(token, clock, &mut Tracer::none()).unwrap();
            outcomes.push(outcome);
            if !outcome.is_pending() {
                return outcomes;
            }
        }
    }

    #[test]
    fn sizer_halves_slow_batches_down_to_min() {
        let mut sizer = BatchSizer::new(&BatchConfig {
            initial_batch: 256,
            ..BatchConfig::interactive()
        });
        assert_eq!(sizer.observe(250 * MS), 128);
        assert_eq!(sizer.observe(250 * MS), 64);
        assert_eq!(sizer.observe(250 * MS), 64, "never below min_batch");
    }

    #[test]
    fn sizer_doubles_fast_batches_up_to_max() {
        let mut sizer = BatchSizer::new(&BatchConfig {
            initial_batch: 1 << 19,
            ..BatchConfig::interactive()
        });
        assert_eq!(sizer.observe(MS), 1 << 20);
        assert_eq!(sizer.observe(MS), 1 << 20, "never above max_batch");
    }

    #[test]
    fn sizer_holds_inside_band() {
        let mut sizer = BatchSizer::new(&BatchConfig::interactive());
        assert_eq!(sizer.observe(100 * MS), 1024);
        assert_eq!(sizer.observe(150 * MS), 1024);
        assert_eq!(sizer.observe(200 * MS), 1024);
    }

    #[test]
    fn sizer_compares_whole_milliseconds() {
        let mut sizer = BatchSizer::new(&BatchConfig::interactive());
        assert_eq!(sizer.observe(200 * MS + 400_000), 1024, "200.4 ms is 200 ms");
        assert_eq!(sizer.observe(99 * MS + 999_999), 2048, "99.9 ms is below 100 ms");
        assert_eq!(sizer.observe(201 * MS), 1024);
    }

    #[test]
    fn sizer_clamps_odd_configs() {
        let sizer = BatchSizer::new(&BatchConfig {
            initial_batch: 0,
            min_batch: 0,
            max_batch: 0,
            ..BatchConfig::interactive()
        });
        assert_eq!(sizer.get(), 1, "a batch always makes progress");
    }

    #[test]
    fn resume_fills_budget_then_yields() {
        let clock = ManualClock::new();
        let rec = Recording::new();
        let mut sched = Scheduler::new(small_batches());
        let token = sched
            .start(geometry(64, 64), 16, rec.sink(), &mut Tracer::none())
            .unwrap();
        assert!(rec.blocks().is_empty(), "start fills nothing");

        let outcome = sched.resume(token, &clock, &mut Tracer::none()).unwrap();
        assert_eq!(outcome, BatchOutcome::Yielded { blocks: 100 });
        assert_eq!(rec.blocks().len(), 100);
        assert_eq!(rec.blocks()[0], Block::new(0, 0, 16, 16));
        let progress = sched.progress().unwrap();
        assert_eq!((progress.visited, progress.total), (100, 4096));
    }

    #[test]
    fn run_completes_exactly_once() {
        let clock = ManualClock::new();
        let rec = Recording::new();
        let mut sched = Scheduler::new(small_batches());
        let token = sched
            .start(geometry(64, 64), 16, rec.sink(), &mut Tracer::none())
            .unwrap();

        let outcomes = drain(&mut sched, token, &clock);
        assert!(matches!(
            outcomes.last(),
            Some(BatchOutcome::Completed { .. })
        ));
        assert_eq!(rec.blocks().len(), 4096);
        assert_eq!(rec.completions(), 1);
        assert_eq!(sched.active(), None, "token cleared on completion");

        let again = sched.resume(token, &clock, &mut Tracer::none()).unwrap();
        assert_eq!(again, BatchOutcome::Superseded);
        assert_eq!(rec.completions(), 1);
    }

    #[test]
    fn completion_stops_the_batch_early() {
        let clock = ManualClock::new();
        let rec = Recording::new();
        let mut sched = Scheduler::new(BatchConfig::interactive());
        let token = sched
            .start(geometry(4, 4), 4, rec.sink(), &mut Tracer::none())
            .unwrap();
        let outcome = sched.resume(token, &clock, &mut Tracer::none()).unwrap();
        assert_eq!(outcome, BatchOutcome::Completed { blocks: 16 });
    }

    #[test]
    fn new_run_supersedes_old_one() {
        let clock = ManualClock::new();
        let first = Recording::new();
        let second = Recording::new();
        let mut sched = Scheduler::new(small_batches());

        let a = sched
            .start(geometry(64, 64), 16, first.sink(), &mut Tracer::none())
            .unwrap();
        sched.resume(a, &clock, &mut Tracer::none()).unwrap();
        let filled_by_a = first.blocks().len();

        let b = sched
            .start(geometry(32, 32), 8, second.sink(), &mut Tracer::none())
            .unwrap();
        assert_ne!(a, b);
        assert!(sched.is_active(b));

        let stale = sched.resume(a, &clock, &mut Tracer::none()).unwrap();
        assert_eq!(stale, BatchOutcome::Superseded);
        assert_eq!(first.blocks().len(), filled_by_a, "stale batch fills nothing");

        drain(&mut sched, b, &clock);
        assert_eq!(second.completions(), 1);
        assert_eq!(first.completions(), 0, "superseded run never completes");
        assert_eq!(first.blocks().len(), filled_by_a);
    }

    #[test]
    fn cancel_retires_only_the_live_run() {
        let clock = ManualClock::new();
        let rec = Recording::new();
        let mut sched = Scheduler::new(small_batches());
        let token = sched
            .start(geometry(16, 16), 4, rec.sink(), &mut Tracer::none())
            .unwrap();

        assert!(!sched.cancel(RunToken(99), &mut Tracer::none()));
        assert!(sched.cancel(token, &mut Tracer::none()));
        assert!(!sched.cancel(token, &mut Tracer::none()));
        assert_eq!(
            sched.resume(token, &clock, &mut Tracer::none()).unwrap(),
            BatchOutcome::Superseded
        );
        assert!(rec.blocks().is_empty());
        assert_eq!(rec.completions(), 0);
    }

    #[test]
    fn invalid_start_keeps_live_run() {
        let rec = Recording::new();
        let mut sched = Scheduler::new(small_batches());
        let token = sched
            .start(geometry(16, 16), 4, rec.sink(), &mut Tracer::none())
            .unwrap();
        let err = sched
            .start(geometry(16, 16), 6, rec.sink(), &mut Tracer::none())
            .unwrap_err();
        assert_eq!(err, InterlaceError::BlockEdgeNotPowerOfTwo(6));
        assert!(sched.is_active(token));
    }

    #[test]
    fn sink_failure_aborts_the_run() {
        let clock = ManualClock::new();
        let rec = Recording::new();
        let mut sched = Scheduler::new(small_batches());
        let token = sched
            .start(
                geometry(64, 64),
                16,
                rec.sink().fail_at(150),
                &mut Tracer::none(),
            )
            .unwrap();

        assert!(sched.resume(token, &clock, &mut Tracer::none()).is_ok());
        let failure = sched
            .resume(token, &clock, &mut Tracer::none())
            .unwrap_err();
        assert_eq!(failure.token, token);
        assert_eq!(failure.visited, 150);
        assert_eq!(sched.active(), None);
        assert_eq!(rec.completions(), 0);
        assert_eq!(
            sched.resume(token, &clock, &mut Tracer::none()).unwrap(),
            BatchOutcome::Superseded
        );
    }

    #[test]
    fn batch_size_converges_into_band() {
        // 1 ms per block: the 100-200 ms band means 100-200 blocks a batch.
        let clock = Rc::new(ManualClock::new());
        let rec = Recording::new();
        let mut sched = Scheduler::new(BatchConfig::interactive());
        let token = sched
            .start(
                geometry(1024, 1024),
                16,
                rec.sink().with_cost(Rc::clone(&clock), MS),
                &mut Tracer::none(),
            )
            .unwrap();

        for _ in 0..10 {
            sched.resume(token, &*clock, &mut Tracer::none()).unwrap();
        }
        assert_eq!(sched.batch_size(), 128);
    }

    #[test]
    fn batch_size_grows_for_cheap_blocks_and_carries_over() {
        // 10 µs per block: 1024 blocks take ~10 ms, far below the band.
        let clock = Rc::new(ManualClock::new());
        let rec = Recording::new();
        let mut sched = Scheduler::new(BatchConfig::interactive());
        let token = sched
            .start(
                geometry(4096, 4096),
                16,
                rec.sink().with_cost(Rc::clone(&clock), 10_000),
                &mut Tracer::none(),
            )
            .unwrap();
        for _ in 0..8 {
            sched.resume(token, &*clock, &mut Tracer::none()).unwrap();
        }
        assert_eq!(sched.batch_size(), 16_384, "10-20k blocks per batch");

        let next = sched
            .start(geometry(8, 8), 8, rec.sink(), &mut Tracer::none())
            .unwrap();
        assert!(sched.is_active(next));
        assert_eq!(sched.batch_size(), 16_384, "estimate survives new runs");
    }

    #[test]
    fn yield_on_pass_end_splits_batches_at_passes() {
        let clock = ManualClock::new();
        let rec = Recording::new();
        let mut sched = Scheduler::new(BatchConfig {
            yield_on_pass_end: true,
            ..BatchConfig::interactive()
        });
        let token = sched
            .start(geometry(64, 64), 16, rec.sink(), &mut Tracer::none())
            .unwrap();

        let blocks: Vec<u32> = drain(&mut sched, token, &clock)
            .into_iter()
            .map(|o| match o {
                BatchOutcome::Yielded { blocks } | BatchOutcome::Completed { blocks } => blocks,
                BatchOutcome::Superseded => 0,
            })
            .collect();
        // The 2048-block final pass outgrows the 1024 budget once; that full
        // (and instant) batch doubles the estimate for the remainder.
        assert_eq!(blocks, [16, 16, 32, 64, 128, 256, 512, 1024, 1024, 1024]);
    }

    #[test]
    fn short_batches_do_not_retune() {
        let clock = ManualClock::new();
        let rec = Recording::new();
        let mut sched = Scheduler::new(BatchConfig {
            yield_on_pass_end: true,
            ..BatchConfig::interactive()
        });
        let token = sched
            .start(geometry(64, 64), 16, rec.sink(), &mut Tracer::none())
            .unwrap();
        sched.resume(token, &clock, &mut Tracer::none()).unwrap();
        assert_eq!(sched.batch_size(), 1024);
    }

    #[test]
    fn split_form_allows_restart_during_batch() {
        let clock = ManualClock::new();
        let first = Recording::new();
        let second = Recording::new();
        let mut sched = Scheduler::new(small_batches());
        let a = sched
            .start(geometry(64, 64), 16, first.sink(), &mut Tracer::none())
            .unwrap();

        let batch = sched.checkout(a).unwrap();
        assert!(sched.checkout(a).is_none(), "one batch at a time");
        let b = sched
            .start(geometry(8, 8), 8, second.sink(), &mut Tracer::none())
            .unwrap();
        let executed = batch.execute(&clock);
        assert_eq!(executed.blocks(), 100, "a running batch finishes");
        assert_eq!(
            sched.settle(executed, &mut Tracer::none()).unwrap(),
            BatchOutcome::Superseded
        );
        assert!(sched.is_active(b));
    }

    #[test]
    fn superseded_batch_that_finishes_the_traversal_does_not_complete() {
        let clock = ManualClock::new();
        let first = Recording::new();
        let second = Recording::new();
        let mut sched = Scheduler::new(BatchConfig::interactive());
        let a = sched
            .start(geometry(4, 4), 4, first.sink(), &mut Tracer::none())
            .unwrap();

        let batch = sched.checkout(a).unwrap();
        let b = sched
            .start(geometry(8, 8), 8, second.sink(), &mut Tracer::none())
            .unwrap();
        let executed = batch.execute(&clock);
        assert_eq!(executed.blocks(), 16);
        assert_eq!(
            sched.settle(executed, &mut Tracer::none()).unwrap(),
            BatchOutcome::Superseded
        );
        assert!(sched.take_completed().is_none());
        assert_eq!(first.blocks().len(), 16);
        assert_eq!(first.completions(), 0);
        assert!(sched.is_active(b));
    }

    #[test]
    fn cancelled_batch_that_finishes_the_traversal_does_not_complete() {
        let clock = ManualClock::new();
        let rec = Recording::new();
        let mut sched = Scheduler::new(BatchConfig::interactive());
        let token = sched
            .start(geometry(4, 4), 4, rec.sink(), &mut Tracer::none())
            .unwrap();

        let batch = sched.checkout(token).unwrap();
        assert!(sched.cancel(token, &mut Tracer::none()));
        let executed = batch.execute(&clock);
        assert_eq!(
            sched.settle(executed, &mut Tracer::none()).unwrap(),
            BatchOutcome::Superseded
        );
        assert!(sched.take_completed().is_none());
        assert_eq!(rec.blocks().len(), 16);
        assert_eq!(rec.completions(), 0);
        assert_eq!(sched.active(), None);
    }

    #[test]
    fn split_form_hands_back_the_completed_sink() {
        let clock = ManualClock::new();
        let rec = Recording::new();
        let mut sched = Scheduler::new(BatchConfig::interactive());
        let token = sched
            .start(geometry(4, 4), 4, rec.sink(), &mut Tracer::none())
            .unwrap();

        let executed = sched.checkout(token).unwrap().execute(&clock);
        assert_eq!(
            sched.settle(executed, &mut Tracer::none()).unwrap(),
            BatchOutcome::Completed { blocks: 16 }
        );
        assert_eq!(sched.active(), None, "retired before the sink hears");
        assert_eq!(rec.completions(), 0);

        let mut sink = sched.take_completed().unwrap();
        sink.complete();
        assert_eq!(rec.completions(), 1);
        assert!(sched.take_completed().is_none());
    }
}

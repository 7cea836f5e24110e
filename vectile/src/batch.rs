//! Batch execution across a fixed worker pool
//!
//! [`BatchRunner`] fans a tile plan out over `W` worker threads. Work is
//! sliced up front by round-robin plan index, so each worker owns a disjoint
//! subset and renders it sequentially; results stream back over a channel to
//! the calling thread, which tallies the final [`BatchReport`].
//!
//! A failing tile never takes its worker down: the failure is recorded and
//! the worker moves on. Cancellation is cooperative; workers check the flag
//! between tiles and leave already-written output untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::plan::TilePlan;
use crate::render::{RenderError, RenderOutcome, TileRenderer};

/// Number of workers used when nothing else is configured.
pub const DEFAULT_WORKERS: usize = 4;

/// Shared run-wide cancellation flag.
///
/// Clones share the underlying flag; cancelling any clone cancels the run.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Workers stop before their next tile.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-tile progress callback: `(completed, total)` attempts so far.
/// Invoked on the thread that called [`BatchRunner::run`].
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Tally of one batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// Tiles written to their final path.
    pub written: usize,
    /// Fully transparent tiles dropped on purpose.
    pub discarded: usize,
    /// Per-tile failures, each identifying its tile.
    pub failed: Vec<RenderError>,
    /// Tiles never attempted because the run was cancelled.
    pub cancelled: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl BatchReport {
    /// Tiles actually attempted, successful or not.
    pub fn completed(&self) -> usize {
        self.written + self.discarded + self.failed.len()
    }

    /// True when every planned tile was attempted and none failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.cancelled == 0
    }
}

/// Outcome of one tile, reported from a worker to the collector.
enum WorkerEvent {
    Written,
    Discarded,
    Failed(RenderError),
}

/// Drives a [`TileRenderer`] over a whole plan with a fixed worker pool.
pub struct BatchRunner {
    renderer: Arc<TileRenderer>,
    workers: usize,
    cancel: CancelFlag,
    progress: Option<ProgressCallback>,
}

impl BatchRunner {
    /// Creates a runner with `workers` threads. A zero count is treated as
    /// one.
    pub fn new(renderer: TileRenderer, workers: usize) -> Self {
        Self {
            renderer: Arc::new(renderer),
            workers: workers.max(1),
            cancel: CancelFlag::new(),
            progress: None,
        }
    }

    /// Installs a shared cancellation flag (e.g. wired to Ctrl-C).
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Installs a per-tile progress callback.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Configured worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Renders every tile in the plan exactly once across the pool and
    /// blocks until all workers have finished.
    ///
    /// Fatal per-run errors do not exist at this level: each tile either
    /// lands, is discarded, fails on its own, or is skipped after
    /// cancellation, and the report accounts for all of them.
    pub fn run(&self, plan: &TilePlan) -> BatchReport {
        let started = Instant::now();
        let total = plan.len();

        debug!(
            "dispatching {} tiles across {} workers",
            total, self.workers
        );

        let (tx, rx) = mpsc::channel();
        let mut handles = Vec::with_capacity(self.workers);

        for slice in plan.partition(self.workers) {
            if slice.is_empty() {
                continue;
            }

            let renderer = Arc::clone(&self.renderer);
            let cancel = self.cancel.clone();
            let tx = tx.clone();

            handles.push(thread::spawn(move || {
                for tile in slice {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let event = match renderer.render(&tile) {
                        Ok(RenderOutcome::Written(_)) => WorkerEvent::Written,
                        Ok(RenderOutcome::Discarded) => WorkerEvent::Discarded,
                        Err(error) => WorkerEvent::Failed(error),
                    };
                    // A closed channel means the collector is gone; stop quietly
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            }));
        }

        // Close our clone so the receive loop ends once workers finish
        drop(tx);

        let mut written = 0;
        let mut discarded = 0;
        let mut failed = Vec::new();
        let mut attempted = 0;

        for event in rx {
            attempted += 1;
            match event {
                WorkerEvent::Written => written += 1,
                WorkerEvent::Discarded => discarded += 1,
                WorkerEvent::Failed(error) => {
                    warn!("{error}");
                    failed.push(error);
                }
            }
            if let Some(callback) = &self.progress {
                callback(attempted, total);
            }
        }

        for handle in handles {
            let _ = handle.join();
        }

        let report = BatchReport {
            written,
            discarded,
            failed,
            cancelled: total - attempted,
            elapsed: started.elapsed(),
        };

        debug!(
            "batch finished: {} written, {} discarded, {} failed, {} cancelled in {:?}",
            report.written,
            report.discarded,
            report.failed.len(),
            report.cancelled,
            report.elapsed
        );

        report
    }
}

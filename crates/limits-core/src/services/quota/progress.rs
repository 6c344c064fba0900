//! Progress tracking
//!
//! [`ProgressCounters`] are bumped by the pipeline; a [`ProgressReporter`]
//! samples them on a fixed cadence and hands snapshots to a callback. The
//! reporter is purely observational and never gates the pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Reporting cadence used by the CLI
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// (completed, total) task counters, monotonic within one run
#[derive(Debug, Default)]
pub struct ProgressCounters {
    completed: AtomicUsize,
    total: AtomicUsize,
}

/// Point-in-time read of [`ProgressCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record newly discovered tasks (one page worth)
    pub fn add_total(&self, n: usize) {
        self.total.fetch_add(n, Ordering::Relaxed);
    }

    /// Record one finished task
    pub fn complete_one(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Zero both counters before a new run
    pub fn reset(&self) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
        }
    }
}

/// Callback receiving periodic progress snapshots
pub type ProgressCallback = Box<dyn Fn(ProgressSnapshot) + Send + Sync>;

/// Background ticker reporting progress until stopped or dropped
#[derive(Debug)]
pub struct ProgressReporter {
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    /// Spawn a ticker that calls `callback` every `period`.
    ///
    /// The first report happens one full period after spawning.
    pub fn spawn(
        counters: Arc<ProgressCounters>,
        period: Duration,
        callback: ProgressCallback,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                callback(counters.snapshot());
            }
        });

        Self { handle }
    }

    /// Stop reporting
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

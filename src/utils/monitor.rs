use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Point-in-time view of batch progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl ProgressSnapshot {
    pub fn in_flight_or_queued(&self) -> usize {
        self.total.saturating_sub(self.completed)
    }
}

/// Advisory row counters shared between worker tasks. Nothing reads these
/// to make decisions; they only feed logs and callers that want to watch.
#[derive(Debug)]
pub struct ProgressMonitor {
    total: AtomicUsize,
    completed: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    start_time: Instant,
}

impl ProgressMonitor {
    pub fn new() -> Self {
        Self {
            total: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Adds `count` rows to the expected total.
    pub fn expect(&self, count: usize) {
        self.total.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record(&self, success: bool) -> ProgressSnapshot {
        if success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.snapshot()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn log_progress(&self, snapshot: &ProgressSnapshot) {
        tracing::info!(
            "📊 Progress: {}/{} rows done ({} succeeded, {} failed), {:?} elapsed",
            snapshot.completed,
            snapshot.total,
            snapshot.succeeded,
            snapshot.failed,
            self.elapsed()
        );
    }
}

impl Default for ProgressMonitor {
    fn default() -> Self {
        Self::new()
    }
}

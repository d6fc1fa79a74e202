use std::time::Instant;

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::Serialize;

use super::percentiles::PercentileSet;
use super::Submission;

// ─── Configuration ───────────────────────────────────────────────

/// HdrHistogram range: 1 μs → 60 s, 3 significant figures
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 60_000_000;
const HIST_SIGFIG: u8 = 3;

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe submission tally shared by every worker.
/// Workers call `record()`, the dispatcher calls `snapshot()` at the end.
pub struct MetricsCollector {
    inner: Mutex<Inner>,
}

/// Summary of a run so far.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Latency of successful submissions only
    pub latency_us: PercentileSet,

    pub total_submissions: u64,
    pub total_errors: u64,
    pub submissions_per_sec: f64,
    pub elapsed_secs: f64,
}

// ─── Internal state ──────────────────────────────────────────────

struct Inner {
    latency_hist: Histogram<u64>,
    total_submissions: u64,
    total_errors: u64,
    // Set lazily by the first recorded submission
    start_time: Option<Instant>,
}

// ─── MetricsCollector impl ───────────────────────────────────────

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
        }
    }

    pub fn record(&self, submission: Submission) {
        self.inner.lock().record(submission);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().snapshot()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Inner impl ──────────────────────────────────────────────────

impl Inner {
    fn new() -> Self {
        Self {
            latency_hist: Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
                .expect("histogram creation"),
            total_submissions: 0,
            total_errors: 0,
            start_time: None,
        }
    }

    fn record(&mut self, submission: Submission) {
        self.start_time.get_or_insert_with(Instant::now);

        self.total_submissions += 1;
        if !submission.success {
            self.total_errors += 1;
            return;
        }

        // Clamp into the histogram's range instead of dropping outliers.
        let latency = submission.latency_us.clamp(HIST_LOW, HIST_HIGH);
        let _ = self.latency_hist.record(latency);
    }

    fn snapshot(&self) -> MetricsSnapshot {
        let elapsed_secs = self
            .start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);

        let per_sec = if elapsed_secs > 0.0 {
            self.total_submissions as f64 / elapsed_secs
        } else {
            0.0
        };

        MetricsSnapshot {
            latency_us: PercentileSet::from_histogram(&self.latency_hist),
            total_submissions: self.total_submissions,
            total_errors: self.total_errors,
            submissions_per_sec: per_sec,
            elapsed_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collector_snapshot() {
        let snap = MetricsCollector::new().snapshot();
        assert_eq!(snap.total_submissions, 0);
        assert_eq!(snap.total_errors, 0);
        assert_eq!(snap.latency_us.count, 0);
        assert_eq!(snap.submissions_per_sec, 0.0);
    }

    #[test]
    fn errors_counted_but_not_timed() {
        let metrics = MetricsCollector::new();
        metrics.record(Submission { latency_us: 120, success: true });
        metrics.record(Submission { latency_us: 0, success: true });
        metrics.record(Submission { latency_us: 999, success: false });

        let snap = metrics.snapshot();
        assert_eq!(snap.total_submissions, 3);
        assert_eq!(snap.total_errors, 1);
        assert_eq!(snap.latency_us.count, 2);
        // 0 μs is clamped up to the histogram floor
        assert_eq!(snap.latency_us.min, 1);
        assert_eq!(snap.latency_us.max, 120);
    }

    #[test]
    fn huge_latency_is_clamped() {
        let metrics = MetricsCollector::new();
        metrics.record(Submission { latency_us: u64::MAX, success: true });
        let snap = metrics.snapshot();
        assert_eq!(snap.latency_us.count, 1);
        assert!(snap.latency_us.max >= HIST_HIGH);
    }
}

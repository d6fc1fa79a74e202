use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::client::{Sample, Store};
use crate::error::Error;
use crate::metrics::{MetricsCollector, Submission};
use crate::report::Report;
use crate::sampler::Sampler;

// ─── Work assignment ─────────────────────────────────────────────

/// How a run is split across workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub total_samples: u64,
    pub workers: u64,
    pub seed: u64,
}

impl Plan {
    /// Samples each worker submits. The remainder of the division is
    /// dropped, not redistributed.
    pub fn per_worker(&self) -> u64 {
        self.total_samples.checked_div(self.workers).unwrap_or(0)
    }

    /// Samples the whole run will submit if nothing fails.
    pub fn submitted(&self) -> u64 {
        self.per_worker() * self.workers
    }
}

// ─── Public entry point ──────────────────────────────────────────

/// Spawns `plan.workers` Tokio tasks that each drain their own Sampler
/// into `store`, waits for every one of them, then reports the first
/// error seen or success.
pub async fn run<S: Store>(store: Arc<S>, plan: Plan, metrics: Arc<MetricsCollector>) -> Report {
    if plan.workers == 0 {
        return Report::Failed {
            error: Error::NoWorkers,
            failed_workers: 0,
            snapshot: metrics.snapshot(),
        };
    }

    let per_worker = plan.per_worker();
    debug!(per_worker, dropped = plan.total_samples - plan.submitted(), "work assigned");

    // One slot per worker: a failing worker never waits to report.
    let (err_tx, mut err_rx) = mpsc::channel(plan.workers as usize);
    let mut handles = Vec::with_capacity(plan.workers as usize);

    for worker_id in 0..plan.workers {
        let store = store.clone();
        let metrics = metrics.clone();
        let errors = err_tx.clone();
        let seed = plan.seed.wrapping_add(worker_id);

        handles.push(tokio::spawn(async move {
            worker(worker_id, per_worker, seed, store, metrics, errors).await;
        }));
    }
    drop(err_tx);

    // Wait for all workers to finish
    let mut errors = Vec::new();
    for h in handles {
        if let Err(e) = h.await {
            warn!(error = %e, "worker task did not complete");
            errors.push(Error::Worker(e));
        }
    }

    // Every sender is gone by now, so this drains whatever was reported.
    let mut reported = Vec::new();
    while let Ok(e) = err_rx.try_recv() {
        reported.push(e);
    }
    reported.append(&mut errors);

    let snapshot = metrics.snapshot();
    let failed_workers = reported.len();
    match reported.into_iter().next() {
        None => Report::Success { snapshot },
        Some(error) => {
            if failed_workers > 1 {
                warn!(failed_workers, "more than one worker failed, reporting the first");
            }
            Report::Failed {
                error,
                failed_workers,
                snapshot,
            }
        }
    }
}

// ─── Worker loop ─────────────────────────────────────────────────

/// Submits `samples` values one at a time, in generation order. Stops at
/// the first failed `store`, reports it, and abandons the rest of its
/// Sampler.
async fn worker<S: Store>(
    id: u64,
    samples: u64,
    seed: u64,
    store: Arc<S>,
    metrics: Arc<MetricsCollector>,
    errors: mpsc::Sender<Error>,
) {
    let mut values = Sampler::spawn(samples, seed);

    while let Some(value) = values.next().await {
        let t0 = Instant::now();
        let result = store.store(Sample::new(value)).await;

        metrics.record(Submission {
            latency_us: t0.elapsed().as_micros() as u64,
            success: result.is_ok(),
        });

        if let Err(e) = result {
            debug!(worker = id, error = %e, "worker stopping early");
            // Capacity equals the worker count, so this should never be full.
            if let Err(e) = errors.try_send(e) {
                warn!(worker = id, error = %e, "could not report worker error");
            }
            return;
        }
    }

    debug!(worker = id, samples, "worker finished");
}

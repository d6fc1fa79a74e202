use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

mod client;
mod config;
mod error;
mod load_generator;
mod metrics;
mod report;
mod sampler;

use client::PerfDbClient;
use config::Config;
use load_generator::Plan;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .finish()
        .init();

    println!();
    println!("Loading sample data set. It will take a while...");
    println!();

    // ── 1. Resolve endpoint & client ─────────────────────────────
    let endpoint = config.endpoint();
    let client = PerfDbClient::new(&endpoint).reject_error_status(config.reject_error_status);

    let plan = Plan {
        total_samples: config.samples,
        workers: config.workers(),
        seed: config.seed,
    };
    info!(
        uri = client.uri(),
        workers = plan.workers,
        per_worker = plan.per_worker(),
        seed = plan.seed,
        "starting load"
    );
    if config.reject_error_status {
        warn!("non-2xx responses will be treated as failures");
    }

    // ── 2. Run workers ───────────────────────────────────────────
    let metrics = Arc::new(metrics::MetricsCollector::new());
    let report = load_generator::run(Arc::new(client), plan, metrics).await;

    // ── 3. Summarize ─────────────────────────────────────────────
    let snapshot = report.snapshot();
    info!(
        submitted = snapshot.total_submissions,
        errors = snapshot.total_errors,
        per_sec = snapshot.submissions_per_sec,
        p50_us = snapshot.latency_us.p50,
        p99_us = snapshot.latency_us.p99,
        "load finished"
    );
    if report.is_success() {
        info!("all workers finished cleanly");
    } else {
        warn!(failed_workers = report.failed_workers(), "run finished with errors");
    }

    println!("{}", report.render(&endpoint));

    if config.json {
        match serde_json::to_string_pretty(snapshot) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!(error = %e, "could not encode summary"),
        }
    }
    // Exit status is 0 either way; the console output carries the outcome.
}

use hdrhistogram::Histogram;
use serde::Serialize;

/// Latency breakdown (μs) printed in the run summary and `--json` output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PercentileSet {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub p999: u64,
    pub count: u64,
}

impl PercentileSet {
    /// Zeroed when the histogram is empty.
    pub fn from_histogram(hist: &Histogram<u64>) -> Self {
        if hist.is_empty() {
            return Self::default();
        }

        Self {
            min: hist.min(),
            max: hist.max(),
            mean: hist.mean(),
            p50: hist.value_at_quantile(0.50),
            p95: hist.value_at_quantile(0.95),
            p99: hist.value_at_quantile(0.99),
            p999: hist.value_at_quantile(0.999),
            count: hist.len(),
        }
    }
}

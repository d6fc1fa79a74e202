pub mod collector;
pub mod percentiles;

pub use collector::{MetricsCollector, MetricsSnapshot};

/// Outcome of one `store` call, as seen by the worker that made it.
#[derive(Debug, Clone, Copy)]
pub struct Submission {
    /// Wall time of the call in microseconds, response drain included
    pub latency_us: u64,
    /// false when `store` returned an error
    pub success: bool,
}

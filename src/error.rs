use thiserror::Error;

/// Everything that can stop a worker (or the whole run) from submitting.
#[derive(Debug, Error)]
pub enum Error {
    /// The sample could not be turned into a JSON body.
    #[error("failed to encode sample: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Building or executing the POST failed (refused, DNS, reset, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Only produced when `reject_error_status` is enabled.
    #[error("POST {uri} answered with status {status}")]
    Status {
        uri: String,
        status: reqwest::StatusCode,
    },

    /// A worker task panicked or was cancelled before it could report.
    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("worker count must be at least 1")]
    NoWorkers,
}

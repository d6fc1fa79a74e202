use crate::client::METRIC_NAME;
use crate::config::Endpoint;
use crate::error::Error;
use crate::metrics::MetricsSnapshot;

/// Final word of a run, handed back by the dispatcher once every worker
/// has terminated.
#[derive(Debug)]
pub enum Report {
    Success {
        snapshot: MetricsSnapshot,
    },
    Failed {
        /// First error drained from the channel; the order among
        /// concurrently failing workers is arbitrary.
        error: Error,
        failed_workers: usize,
        snapshot: MetricsSnapshot,
    },
}

impl Report {
    pub fn is_success(&self) -> bool {
        matches!(self, Report::Success { .. })
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Report::Success { .. } => None,
            Report::Failed { error, .. } => Some(error),
        }
    }

    pub fn failed_workers(&self) -> usize {
        match self {
            Report::Success { .. } => 0,
            Report::Failed { failed_workers, .. } => *failed_workers,
        }
    }

    pub fn snapshot(&self) -> &MetricsSnapshot {
        match self {
            Report::Success { snapshot } | Report::Failed { snapshot, .. } => snapshot,
        }
    }

    /// What the operator sees on the console.
    pub fn render(&self, endpoint: &Endpoint) -> String {
        match self.error() {
            None => guidance(endpoint),
            Some(error) => error.to_string(),
        }
    }
}

/// Points the operator at the query views of the metric just loaded.
pub fn guidance(endpoint: &Endpoint) -> String {
    format!(
        "Please check out the summary:\n    {}\n\n\
         Histogram:\n    {}\n\n\
         And heatmap graph:\n    {}\n",
        endpoint.view_uri(METRIC_NAME, "summary"),
        endpoint.view_uri(METRIC_NAME, "histo"),
        endpoint.view_uri(METRIC_NAME, "heatmap"),
    )
}

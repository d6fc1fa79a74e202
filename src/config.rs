use clap::Parser;

// ─── Command line / environment ──────────────────────────────────

/// Loads a synthetic metric data set into a perf-db ingestion endpoint.
#[derive(Debug, Clone, Parser)]
#[command(version)]
pub struct Config {
    /// Total number of samples to submit (split evenly across workers)
    #[arg(long, env = "LOADGEN_SAMPLES", default_value_t = 100_000)]
    pub samples: u64,

    /// Number of concurrent workers [default: 2 × CPUs]
    #[arg(
        long,
        env = "LOADGEN_WORKERS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub workers: Option<u64>,

    /// Ingestion service address
    #[arg(long, env = "LOADGEN_HOST", default_value = "127.0.0.1:8080")]
    pub host: String,

    /// Snapshot namespace
    #[arg(long, env = "LOADGEN_SNAPSHOT", default_value = "snapshot")]
    pub snapshot: String,

    /// Source namespace
    #[arg(long, env = "LOADGEN_SOURCE", default_value = "source")]
    pub source: String,

    /// Base seed; worker `i` samples with `seed + i`
    #[arg(long, env = "LOADGEN_SEED", default_value_t = 0)]
    pub seed: u64,

    /// Count non-2xx responses as failures (changes the ingestion contract)
    #[arg(long, env = "LOADGEN_REJECT_ERROR_STATUS")]
    pub reject_error_status: bool,

    /// Also print the run's latency summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl Config {
    pub fn workers(&self) -> u64 {
        self.workers.unwrap_or_else(default_workers)
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            host: self.host.clone(),
            snapshot: self.snapshot.clone(),
            source: self.source.clone(),
        }
    }
}

fn default_workers() -> u64 {
    2 * num_cpus::get() as u64
}

// ─── Endpoint descriptor ─────────────────────────────────────────

/// Where samples go: `http://{host}/{snapshot}/{source}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub snapshot: String,
    pub source: String,
}

impl Endpoint {
    pub fn uri(&self) -> String {
        format!("http://{}/{}/{}", self.host, self.snapshot, self.source)
    }

    /// Query URL for one view (`summary`, `histo`, `heatmap`) of a metric.
    pub fn view_uri(&self, metric: &str, view: &str) -> String {
        format!("{}/{metric}/{view}", self.uri())
    }
}

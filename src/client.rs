use std::future::Future;

use serde::Serialize;

use crate::config::Endpoint;
use crate::error::Error;

/// Name every sample is stored under on the ingestion side.
pub const METRIC_NAME: &str = "metric";

/// A single observation. Serializes to `{"metric": <value>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub metric: u64,
}

impl Sample {
    pub fn new(metric: u64) -> Self {
        Self { metric }
    }
}

/// Anything a worker can hand samples to. Shared read-only across workers.
pub trait Store: Send + Sync + 'static {
    fn store(&self, sample: Sample) -> impl Future<Output = Result<(), Error>> + Send;
}

/// HTTP client for the metrics ingestion endpoint.
///
/// `reqwest::Client` pools connections internally, so one instance is
/// shared by every worker. Draining each response body lets the pool
/// reuse the connection.
#[derive(Debug, Clone)]
pub struct PerfDbClient {
    http: reqwest::Client,
    uri: String,
    reject_error_status: bool,
}

impl PerfDbClient {
    pub fn new(endpoint: &Endpoint) -> Self {
        Self {
            http: reqwest::Client::new(),
            uri: endpoint.uri(),
            reject_error_status: false,
        }
    }

    /// Treat non-2xx answers as failures. Off by default: the ingestion
    /// contract only promises that *some* response comes back.
    pub fn reject_error_status(mut self, reject: bool) -> Self {
        self.reject_error_status = reject;
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Store for PerfDbClient {
    async fn store(&self, sample: Sample) -> Result<(), Error> {
        let body = serde_json::to_vec(&sample)?;

        let response = self.http.post(&self.uri).body(body).send().await?;
        let status = response.status();

        // Always read the body to the end, whatever the status.
        response.bytes().await?;

        if self.reject_error_status && !status.is_success() {
            return Err(Error::Status {
                uri: self.uri.clone(),
                status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, routing::post, Router};
    use parking_lot::Mutex;

    fn endpoint(host: String) -> Endpoint {
        Endpoint {
            host,
            snapshot: "snapshot".into(),
            source: "source".into(),
        }
    }

    /// Serves `POST /snapshot/source`, remembers bodies, answers `status`.
    async fn sink(status: StatusCode) -> (String, Arc<Mutex<Vec<String>>>) {
        let bodies = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/snapshot/source",
                post(
                    move |State(bodies): State<Arc<Mutex<Vec<String>>>>, body: String| async move {
                        bodies.lock().push(body);
                        (status, "ignored")
                    },
                ),
            )
            .with_state(bodies.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (addr.to_string(), bodies)
    }

    #[test]
    fn sample_encodes_as_single_key_object() {
        let json = serde_json::to_string(&Sample::new(42)).unwrap();
        assert_eq!(json, format!(r#"{{"{METRIC_NAME}":42}}"#));
    }

    #[tokio::test]
    async fn posts_json_body_to_endpoint_uri() {
        let (host, bodies) = sink(StatusCode::OK).await;
        let client = PerfDbClient::new(&endpoint(host.clone()));
        assert_eq!(client.uri(), format!("http://{host}/snapshot/source"));

        client.store(Sample::new(7)).await.unwrap();
        client.store(Sample::new(u64::MAX)).await.unwrap();

        let bodies = bodies.lock().clone();
        assert_eq!(
            bodies,
            vec![
                r#"{"metric":7}"#.to_string(),
                format!(r#"{{"metric":{}}}"#, u64::MAX),
            ]
        );
    }

    #[tokio::test]
    async fn error_status_is_success_by_default() {
        let (host, _) = sink(StatusCode::INTERNAL_SERVER_ERROR).await;
        let client = PerfDbClient::new(&endpoint(host));
        assert!(client.store(Sample::new(1)).await.is_ok());
    }

    #[tokio::test]
    async fn error_status_rejected_when_enabled() {
        let (host, _) = sink(StatusCode::BAD_REQUEST).await;
        let client = PerfDbClient::new(&endpoint(host)).reject_error_status(true);
        match client.store(Sample::new(1)).await {
            Err(Error::Status { status, .. }) => assert_eq!(status.as_u16(), 400),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        // Grab a free port, then close it so nothing is listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = listener.local_addr().unwrap().to_string();
        drop(listener);

        let client = PerfDbClient::new(&endpoint(host));
        let err = client.store(Sample::new(1)).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "got {err:?}");
    }
}

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::app::CmtError;
use crate::fetcher::{ArtifactFetcher, FetchFailure, FetchOutcome, FetchRequest};

pub const DEFAULT_WORKERS: usize = 4;

pub struct ParallelFetcher {
    fetcher: Arc<ArtifactFetcher>,
    semaphore: Arc<Semaphore>,
}

impl ParallelFetcher {
    pub fn new(fetcher: Arc<ArtifactFetcher>) -> Self {
        Self::with_workers(fetcher, DEFAULT_WORKERS)
    }

    pub fn with_workers(fetcher: Arc<ArtifactFetcher>, workers: usize) -> Self {
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Ensure every request, at most `workers` at a time.
    ///
    /// Results come back in request order, one per request. A task that
    /// panicked is reported as a failed outcome for its request.
    pub async fn ensure_all(
        &self,
        requests: Vec<FetchRequest>,
    ) -> Vec<(FetchRequest, FetchOutcome)> {
        let mut handles = Vec::new();

        for request in requests {
            let fetcher = self.fetcher.clone();
            let semaphore = self.semaphore.clone();
            let task_request = request.clone();

            let handle = tokio::spawn(async move {
                // The semaphore is never closed, so a permit is always granted.
                let _permit = semaphore.acquire_owned().await.ok();
                fetcher.ensure_file(&task_request).await
            });

            handles.push((request, handle));
        }

        let mut results = Vec::new();
        for (request, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Task join error for {}: {}", request.source_url, e);
                    FetchOutcome::Failed(FetchFailure::Io(CmtError::Other(format!(
                        "Task join error: {}",
                        e
                    ))))
                }
            };
            results.push((request, outcome));
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::fetcher::http_fetcher::HttpFetcher;
    use crate::app::Result;
    use crate::fetcher::{FetchResponse, Fetcher};
    use async_trait::async_trait;
    use futures::StreamExt;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_ensure_all_reports_each_request_in_order() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/routes/race-101.gpx"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<gpx/>".to_vec()))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/routes/race-102.gpx"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let requests: Vec<FetchRequest> = ["race-101", "race-102"]
            .iter()
            .map(|id| {
                FetchRequest::new(
                    format!("{}/routes/{}.gpx", mock_server.uri(), id),
                    dir.path().join(format!("{}.gpx", id)),
                )
            })
            .collect();

        let http = HttpFetcher::new(&NetworkConfig::default()).unwrap();
        let parallel =
            ParallelFetcher::with_workers(Arc::new(ArtifactFetcher::new(Arc::new(http))), 2);
        let results = parallel.ensure_all(requests).await;

        assert_eq!(results.len(), 2);
        assert!(results[0].0.destination.ends_with("race-101.gpx"));
        assert!(matches!(results[0].1, FetchOutcome::Downloaded { bytes: 6 }));
        assert!(matches!(
            results[1].1,
            FetchOutcome::Failed(FetchFailure::HttpStatus(404))
        ));
        assert!(dir.path().join("race-101.gpx").is_file());
        assert!(!dir.path().join("race-102.gpx").exists());
    }

    /// Fetcher that panics on one URL and returns 404 for the rest.
    struct PanicsOn(&'static str);

    #[async_trait]
    impl Fetcher for PanicsOn {
        async fn get(&self, url: &str) -> Result<FetchResponse> {
            if url == self.0 {
                panic!("fetcher crashed on {}", url);
            }
            Ok(FetchResponse {
                status: 404,
                body: futures::stream::empty().boxed(),
            })
        }
    }

    #[tokio::test]
    async fn test_panicked_task_still_reports_its_request() {
        let dir = TempDir::new().unwrap();
        let requests = vec![
            FetchRequest::new("mem://a", dir.path().join("a.gpx")),
            FetchRequest::new("mem://b", dir.path().join("b.gpx")),
            FetchRequest::new("mem://c", dir.path().join("c.gpx")),
        ];

        let fetcher = ArtifactFetcher::new(Arc::new(PanicsOn("mem://b")));
        let parallel = ParallelFetcher::with_workers(Arc::new(fetcher), 2);
        let results = parallel.ensure_all(requests).await;

        let urls: Vec<&str> = results.iter().map(|(r, _)| r.source_url.as_str()).collect();
        assert_eq!(urls, vec!["mem://a", "mem://b", "mem://c"]);
        assert!(matches!(
            results[0].1,
            FetchOutcome::Failed(FetchFailure::HttpStatus(404))
        ));
        assert!(matches!(
            results[1].1,
            FetchOutcome::Failed(FetchFailure::Io(CmtError::Other(_)))
        ));
        assert!(matches!(
            results[2].1,
            FetchOutcome::Failed(FetchFailure::HttpStatus(404))
        ));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let http = HttpFetcher::new(&NetworkConfig::default()).unwrap();
        let parallel =
            ParallelFetcher::with_workers(Arc::new(ArtifactFetcher::new(Arc::new(http))), 0);
        let results = parallel.ensure_all(Vec::new()).await;
        assert!(results.is_empty());
    }
}

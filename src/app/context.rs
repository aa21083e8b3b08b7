use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::{ParallelFetcher, DEFAULT_WORKERS};
use crate::fetcher::{ArtifactFetcher, Fetcher};

pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<ArtifactFetcher>,
    pub parallel_fetcher: ParallelFetcher,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_workers(config, DEFAULT_WORKERS)
    }

    pub fn with_workers(config: Config, workers: usize) -> Result<Self> {
        let http: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.network)?);
        Ok(Self::with_fetcher(config, http, workers))
    }

    /// Build a context around any [`Fetcher`], e.g. an in-process one.
    pub fn with_fetcher(
        config: Config,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        workers: usize,
    ) -> Self {
        let fetcher = Arc::new(ArtifactFetcher::new(fetcher));
        let parallel_fetcher = ParallelFetcher::with_workers(fetcher.clone(), workers);

        Self {
            config,
            fetcher,
            parallel_fetcher,
        }
    }
}

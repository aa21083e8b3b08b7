use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;

use crate::app::{CmtError, Result};
use crate::config::NetworkConfig;
use crate::fetcher::{FetchResponse, Fetcher};

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(CmtError::from))
            .boxed();

        Ok(FetchResponse { status, body })
    }
}

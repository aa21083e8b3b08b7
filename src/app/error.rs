use thiserror::Error;

use crate::config::ConfigError;
use crate::fetcher::FetchFailure;

#[derive(Error, Debug)]
pub enum CmtError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Download failed: {0}")]
    Fetch(#[source] Box<FetchFailure>),

    #[error("Invalid race id: {0}")]
    InvalidRaceId(String),

    #[error("{0}")]
    Other(String),
}

impl From<FetchFailure> for CmtError {
    fn from(failure: FetchFailure) -> Self {
        CmtError::Fetch(Box::new(failure))
    }
}

pub type Result<T> = std::result::Result<T, CmtError>;

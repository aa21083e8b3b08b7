pub mod ensure;
pub mod http_fetcher;
pub mod parallel;

use std::fmt;
use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::app::{CmtError, Result};

pub use ensure::{file_exists_with_size, ArtifactFetcher};

/// Suffix appended to the destination file name while a download is in flight.
pub const TEMP_SUFFIX: &str = ".download";

/// Response body as a stream of chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

pub struct FetchResponse {
    pub status: u16,
    pub body: ByteStream,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Fetcher {
    /// Issue a plain GET. Non-2xx statuses are returned, not raised.
    async fn get(&self, url: &str) -> Result<FetchResponse>;
}

/// One fetch-if-missing job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub source_url: String,
    pub destination: PathBuf,
    pub minimum_valid_bytes: u64,
}

impl FetchRequest {
    pub fn new(source_url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into(),
            destination: destination.into(),
            minimum_valid_bytes: 1,
        }
    }

    pub fn with_minimum_bytes(mut self, minimum_valid_bytes: u64) -> Self {
        self.minimum_valid_bytes = minimum_valid_bytes;
        self
    }

    /// `<destination>.download`, next to the destination so the commit is a same-directory rename.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self
            .destination
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(TEMP_SUFFIX);
        self.destination.with_file_name(name)
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    /// Destination already satisfied the size threshold; nothing was requested
    AlreadyPresent,
    /// Body was streamed to disk and committed
    Downloaded { bytes: u64 },
    Failed(FetchFailure),
}

impl FetchOutcome {
    /// True when the destination is usable after the call.
    pub fn is_available(&self) -> bool {
        !matches!(self, FetchOutcome::Failed(_))
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::AlreadyPresent => f.write_str("already present"),
            FetchOutcome::Downloaded { bytes } => write!(f, "downloaded {} bytes", bytes),
            FetchOutcome::Failed(failure) => write!(f, "failed: {}", failure),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("transfer failed: {0}")]
    Io(#[source] CmtError),

    #[error("downloaded {bytes} bytes, expected at least {minimum}")]
    EmptyResult { bytes: u64, minimum: u64 },

    #[error("could not move download into place: {0}")]
    Commit(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_is_colocated() {
        let request = FetchRequest::new("https://host/a.bin", "/data/a.bin");
        assert_eq!(request.temp_path(), PathBuf::from("/data/a.bin.download"));
    }

    #[test]
    fn test_temp_path_keeps_extension_chain() {
        let request = FetchRequest::new("https://host/x", "/cache/routes/race-101.gpx");
        assert_eq!(
            request.temp_path(),
            PathBuf::from("/cache/routes/race-101.gpx.download")
        );
    }

    #[test]
    fn test_default_minimum_is_one_byte() {
        let request = FetchRequest::new("https://host/a.bin", "/data/a.bin");
        assert_eq!(request.minimum_valid_bytes, 1);
        assert_eq!(request.with_minimum_bytes(1024).minimum_valid_bytes, 1024);
    }

    #[test]
    fn test_outcome_availability() {
        assert!(FetchOutcome::AlreadyPresent.is_available());
        assert!(FetchOutcome::Downloaded { bytes: 3 }.is_available());
        assert!(!FetchOutcome::Failed(FetchFailure::HttpStatus(404)).is_available());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            FetchOutcome::Downloaded { bytes: 500 }.to_string(),
            "downloaded 500 bytes"
        );
        assert_eq!(
            FetchOutcome::Failed(FetchFailure::HttpStatus(404)).to_string(),
            "failed: HTTP status 404"
        );
        assert_eq!(
            FetchOutcome::Failed(FetchFailure::EmptyResult { bytes: 0, minimum: 1 }).to_string(),
            "failed: downloaded 0 bytes, expected at least 1"
        );
    }
}

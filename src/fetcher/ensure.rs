//! Download-if-missing with atomic placement.
//!
//! The body is streamed into `<destination>.download` and renamed over the
//! destination only once it is complete and passes the size check, so the
//! destination is either absent or whole.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::app::Result;
use crate::fetcher::{ByteStream, FetchFailure, FetchOutcome, FetchRequest, Fetcher};

/// True when `path` is a regular file of at least `minimum_bytes`.
pub fn file_exists_with_size(path: &Path, minimum_bytes: u64) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() >= minimum_bytes)
        .unwrap_or(false)
}

type PathLock = Arc<tokio::sync::Mutex<()>>;

pub struct ArtifactFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    locks: Mutex<HashMap<PathBuf, PathLock>>,
}

impl ArtifactFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self {
            fetcher,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Make sure `request.destination` exists, downloading it if needed.
    ///
    /// Callers for the same destination are serialized: the first one
    /// downloads, the rest observe [`FetchOutcome::AlreadyPresent`]. Failures
    /// are logged here and returned; nothing is retried.
    pub async fn ensure_file(&self, request: &FetchRequest) -> FetchOutcome {
        let lock = self.lock_for(&request.destination);
        let outcome = {
            let _guard = lock.lock().await;
            self.ensure_file_locked(request).await
        };
        self.release(&request.destination, lock);
        outcome
    }

    fn lock_for(&self, path: &Path) -> PathLock {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    fn release(&self, path: &Path, lock: PathLock) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Only the table and this caller hold it: nobody is waiting.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(path);
        }
    }

    async fn ensure_file_locked(&self, request: &FetchRequest) -> FetchOutcome {
        let destination = &request.destination;

        if is_present(destination, request.minimum_valid_bytes).await {
            tracing::info!("File already exists at {}", destination.display());
            return FetchOutcome::AlreadyPresent;
        }

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent).await {
                tracing::warn!("Could not create directory {}: {}", parent.display(), e);
            }
        }

        let temp_path = request.temp_path();
        let response = match self.fetcher.get(&request.source_url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Error downloading {}: {}", request.source_url, e);
                return FetchOutcome::Failed(FetchFailure::Io(e));
            }
        };

        if !response.is_success() {
            tracing::error!(
                "Failed to download {}: HTTP {}",
                request.source_url,
                response.status
            );
            remove_temp(&temp_path).await;
            return FetchOutcome::Failed(FetchFailure::HttpStatus(response.status));
        }

        let bytes = match write_body(response.body, &temp_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Error downloading {}: {}", request.source_url, e);
                remove_temp(&temp_path).await;
                return FetchOutcome::Failed(FetchFailure::Io(e));
            }
        };

        if bytes < request.minimum_valid_bytes {
            tracing::error!(
                "Downloaded {} is too small ({} bytes); deleting temp file",
                request.source_url,
                bytes
            );
            remove_temp(&temp_path).await;
            return FetchOutcome::Failed(FetchFailure::EmptyResult {
                bytes,
                minimum: request.minimum_valid_bytes,
            });
        }

        if let Err(e) = fs::rename(&temp_path, destination).await {
            tracing::error!(
                "Failed to move {} to {}: {}",
                temp_path.display(),
                destination.display(),
                e
            );
            return FetchOutcome::Failed(FetchFailure::Commit(e));
        }

        tracing::info!("Downloaded {} bytes to {}", bytes, destination.display());
        FetchOutcome::Downloaded { bytes }
    }
}

/// Async twin of [`file_exists_with_size`].
async fn is_present(path: &Path, minimum_bytes: u64) -> bool {
    fs::metadata(path)
        .await
        .map(|meta| meta.is_file() && meta.len() >= minimum_bytes)
        .unwrap_or(false)
}

async fn write_body(mut body: ByteStream, temp_path: &Path) -> Result<u64> {
    let mut file = fs::File::create(temp_path).await?;
    let mut written = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

async fn remove_temp(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Could not remove {}: {}", temp_path.display(), e);
        }
    }
}

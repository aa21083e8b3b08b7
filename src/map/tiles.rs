use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::app::AppContext;
use crate::domain::Artifact;
use crate::fetcher::{file_exists_with_size, FetchOutcome};

/// Start downloading the offline tile package in the background.
///
/// Returns `None` when the package is already present or its location
/// can't be determined; there is nothing to wait for in either case.
pub fn schedule_tile_download(ctx: &Arc<AppContext>) -> Option<JoinHandle<FetchOutcome>> {
    let request = match Artifact::TilePackage.request(&ctx.config) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Tile package location unavailable; skipping download: {}", e);
            return None;
        }
    };

    if file_exists_with_size(&request.destination, request.minimum_valid_bytes) {
        tracing::info!(
            "Tile package already present at {}",
            request.destination.display()
        );
        return None;
    }

    let fetcher = ctx.fetcher.clone();
    Some(tokio::spawn(async move { fetcher.ensure_file(&request).await }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context(mock_server: &MockServer, dir: &TempDir) -> Arc<AppContext> {
        let mut config = Config::default();
        config.storage.data_dir = Some(dir.path().to_path_buf());
        config.tiles.url = format!("{}/corfu.mbtiles", mock_server.uri());
        Arc::new(AppContext::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_downloads_missing_package_in_background() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/corfu.mbtiles"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x53u8; 2048]))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let ctx = context(&mock_server, &dir);

        let handle = schedule_tile_download(&ctx).expect("download should be scheduled");
        let outcome = handle.await.unwrap();

        assert!(matches!(outcome, FetchOutcome::Downloaded { bytes: 2048 }));
        assert_eq!(
            std::fs::metadata(dir.path().join("maps").join("corfu.mbtiles"))
                .unwrap()
                .len(),
            2048
        );
    }

    #[tokio::test]
    async fn test_present_package_is_not_scheduled() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("maps")).unwrap();
        std::fs::write(dir.path().join("maps").join("corfu.mbtiles"), b"tiles").unwrap();
        let ctx = context(&mock_server, &dir);

        assert!(schedule_tile_download(&ctx).is_none());
    }
}

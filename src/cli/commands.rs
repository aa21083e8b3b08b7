use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::app::{AppContext, CmtError, Result};
use crate::domain::{Artifact, RaceId};
use crate::fetcher::FetchOutcome;
use crate::map::{load_route_overlay, schedule_tile_download, TileSource, Viewport};

pub async fn download_tiles(ctx: &Arc<AppContext>) -> Result<()> {
    let Some(handle) = schedule_tile_download(ctx) else {
        let path = Artifact::TilePackage.destination(&ctx.config)?;
        println!("Tile package already present: {}", path.display());
        return Ok(());
    };

    let outcome = handle
        .await
        .map_err(|e| CmtError::Other(format!("Tile download task failed: {}", e)))?;

    match outcome {
        FetchOutcome::Failed(failure) => Err(failure.into()),
        other => {
            println!("Tile package {}", other);
            Ok(())
        }
    }
}

pub async fn show_route(ctx: &AppContext, race_id: &str, json: bool) -> Result<()> {
    let race_id: RaceId = race_id.parse()?;
    let overlay = load_route_overlay(ctx, &race_id).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&overlay)?);
        return Ok(());
    }

    match overlay.bounds {
        Some(bounds) => {
            println!("Route {}: {} points", race_id, overlay.points.len());
            println!(
                "  bounds N {:.5} S {:.5} E {:.5} W {:.5}",
                bounds.north, bounds.south, bounds.east, bounds.west
            );
            let center = bounds.center();
            println!("  center {:.5}, {:.5}", center.lat, center.lon);
        }
        None => {
            let viewport = Viewport::from(&ctx.config.map);
            println!("No route available for race {}", race_id);
            println!(
                "  map stays at {:.4}, {:.4} zoom {}",
                viewport.center.lat, viewport.center.lon, viewport.zoom
            );
        }
    }

    Ok(())
}

pub async fn prefetch_routes(ctx: &AppContext, race_ids: &[String]) -> Result<()> {
    let mut requests = Vec::new();
    for race_id in race_ids {
        let artifact = Artifact::RaceRoute(race_id.parse()?);
        requests.push(artifact.request(&ctx.config)?);
    }

    println!("Prefetching {} routes...", requests.len());

    let results = ctx.parallel_fetcher.ensure_all(requests).await;

    let mut downloaded = 0;
    let mut errors = 0;

    for (request, outcome) in results {
        match &outcome {
            FetchOutcome::Downloaded { .. } => downloaded += 1,
            FetchOutcome::Failed(_) => errors += 1,
            FetchOutcome::AlreadyPresent => {}
        }
        println!("  {}: {}", request.destination.display(), outcome);
    }

    println!(
        "Prefetch complete: {} downloaded, {} errors",
        downloaded, errors
    );
    Ok(())
}

pub fn show_status(ctx: &AppContext, race_ids: &[String]) -> Result<()> {
    let mut artifacts = vec![Artifact::TilePackage];
    for race_id in race_ids {
        artifacts.push(Artifact::RaceRoute(race_id.parse()?));
    }

    for artifact in artifacts {
        let path = artifact.destination(&ctx.config)?;
        println!("{}\n  {}", artifact, describe_file(&path));
    }

    match TileSource::resolve(&ctx.config)? {
        TileSource::Offline(path) => println!("Map tiles: offline ({})", path.display()),
        TileSource::Default => println!("Map tiles: default online tiles"),
    }

    Ok(())
}

fn describe_file(path: &Path) -> String {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {
            let modified = meta
                .modified()
                .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            format!("{} ({} bytes, {})", path.display(), meta.len(), modified)
        }
        _ => format!("{} (missing)", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_describe_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("race-1.gpx");
        assert!(describe_file(&path).ends_with("(missing)"));
    }

    #[test]
    fn test_describe_present_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("race-1.gpx");
        std::fs::write(&path, b"<gpx/>").unwrap();
        assert!(describe_file(&path).contains("(6 bytes, "));
    }
}

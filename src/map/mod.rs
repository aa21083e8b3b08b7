//! What the map screen needs: a tile source, an initial viewport and
//! an optional route overlay.

mod route;
mod tiles;

pub use route::{load_route_overlay, RouteOverlay};
pub use tiles::schedule_tile_download;

use std::path::PathBuf;

use crate::app::Result;
use crate::config::{Config, MapConfig};
use crate::domain::{Artifact, Coordinate};
use crate::fetcher::file_exists_with_size;

#[derive(Debug, Clone, PartialEq)]
pub enum TileSource {
    /// Render from the downloaded MBTiles package
    Offline(PathBuf),
    /// Package not available yet; use the online default tiles
    Default,
}

impl TileSource {
    pub fn resolve(config: &Config) -> Result<Self> {
        let path = Artifact::TilePackage.destination(config)?;

        if file_exists_with_size(&path, config.tiles.min_bytes) {
            Ok(TileSource::Offline(path))
        } else {
            tracing::info!("Offline tile package not available yet; using default tiles");
            Ok(TileSource::Default)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: f64,
}

impl From<&MapConfig> for Viewport {
    fn from(config: &MapConfig) -> Self {
        Self {
            center: Coordinate::new(config.center_lat, config.center_lon),
            zoom: config.zoom,
        }
    }
}

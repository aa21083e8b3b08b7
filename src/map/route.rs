use serde::Serialize;

use crate::app::AppContext;
use crate::domain::{Artifact, BoundingBox, Coordinate, RaceId};
use crate::gpx::read_track_points;

/// Route drawn on top of the map for one race.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOverlay {
    pub race_id: String,
    pub points: Vec<Coordinate>,
    /// `None` when there is nothing to draw
    pub bounds: Option<BoundingBox>,
}

impl RouteOverlay {
    pub fn empty(race_id: &RaceId) -> Self {
        Self::new(race_id, Vec::new())
    }

    pub fn new(race_id: &RaceId, points: Vec<Coordinate>) -> Self {
        let bounds = BoundingBox::from_points(&points);
        Self {
            race_id: race_id.to_string(),
            points,
            bounds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Fetch the race's GPX track if it isn't cached yet and parse it.
///
/// Never fails: if the track can't be obtained the overlay is empty and
/// the map shows no route.
pub async fn load_route_overlay(ctx: &AppContext, race_id: &RaceId) -> RouteOverlay {
    let request = match Artifact::RaceRoute(race_id.clone()).request(&ctx.config) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("Error loading GPX for race {}: {}", race_id, e);
            return RouteOverlay::empty(race_id);
        }
    };

    let outcome = ctx.fetcher.ensure_file(&request).await;
    if !outcome.is_available() {
        return RouteOverlay::empty(race_id);
    }

    let path = request.destination;
    match tokio::task::spawn_blocking(move || read_track_points(&path)).await {
        Ok(points) => {
            tracing::debug!("Loaded {} track points for race {}", points.len(), race_id);
            RouteOverlay::new(race_id, points)
        }
        Err(e) => {
            tracing::error!("Error loading GPX for race {}: {}", race_id, e);
            RouteOverlay::empty(race_id)
        }
    }
}

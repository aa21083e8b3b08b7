//! # CMT
//!
//! Offline map data for the CMT race tracker: one MBTiles tile package and
//! one GPX track per race, each downloaded once and kept on disk.
//!
//! ## Architecture
//!
//! ```text
//! Artifact → FetchRequest → ArtifactFetcher (temp file + rename) → disk → GPX parser → map overlay
//! ```
//!
//! - [`fetcher`]: download-if-missing with atomic placement
//! - [`gpx`]: streaming track point extraction
//! - [`map`]: tile source selection and route overlays for the map screen
//!
//! ## Quick Start
//!
//! ```bash
//! # Fetch the offline tile package
//! cmt tiles
//!
//! # Fetch and summarize a race route
//! cmt route race-101
//!
//! # Warm the cache for several races
//! cmt prefetch race-101 race-102 race-103
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together configuration,
/// the artifact fetcher and the parallel fetcher.
pub mod app;

/// Command-line interface using clap.
///
/// - `tiles` - Download the tile package if missing
/// - `route <race-id>` - Fetch and summarize a race route
/// - `prefetch <race-id>...` - Fetch several routes concurrently
/// - `status` - Show which artifacts are on disk
pub mod cli;

/// Configuration loaded from `~/.config/cmt/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Artifact`](domain::Artifact): tile package or race route, resolved to URL and path
/// - [`Coordinate`](domain::Coordinate) and [`BoundingBox`](domain::BoundingBox)
pub mod domain;

/// Download-if-missing with atomic placement.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for plain GETs
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ArtifactFetcher`](fetcher::ArtifactFetcher): temp file, size check, rename
/// - [`ParallelFetcher`](fetcher::parallel::ParallelFetcher): Concurrent ensures with semaphore
pub mod fetcher;

/// GPX track point extraction.
pub mod gpx;

/// Map screen helpers: tile source, viewport, route overlay.
pub mod map;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::app::{CmtError, Result};
use crate::config::Config;
use crate::fetcher::FetchRequest;

/// Identifier of a race, safe to use as a file name and URL segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RaceId(String);

impl RaceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RaceId {
    type Err = CmtError;

    fn from_str(s: &str) -> Result<Self> {
        let valid = !s.is_empty()
            && !s.starts_with('.')
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(CmtError::InvalidRaceId(s.to_string()))
        }
    }
}

impl fmt::Display for RaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Something the app downloads once and keeps on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// The offline MBTiles package
    TilePackage,
    /// The GPX track of one race
    RaceRoute(RaceId),
}

impl Artifact {
    pub fn source_url(&self, config: &Config) -> Result<String> {
        match self {
            Artifact::TilePackage => Ok(config.tiles.url.clone()),
            Artifact::RaceRoute(race_id) => {
                let mut base = config.routes.base_url.clone();
                if !base.ends_with('/') {
                    base.push('/');
                }
                let url = Url::parse(&base)?.join(&format!("{}.gpx", race_id))?;
                Ok(url.to_string())
            }
        }
    }

    /// `<data_dir>/maps/<file>` for tiles, `<cache_dir>/routes/<race>.gpx` for routes.
    pub fn destination(&self, config: &Config) -> Result<PathBuf> {
        match self {
            Artifact::TilePackage => Ok(config
                .data_dir()?
                .join("maps")
                .join(&config.tiles.file_name)),
            Artifact::RaceRoute(race_id) => Ok(config
                .cache_dir()?
                .join("routes")
                .join(format!("{}.gpx", race_id))),
        }
    }

    pub fn minimum_bytes(&self, config: &Config) -> u64 {
        match self {
            Artifact::TilePackage => config.tiles.min_bytes,
            Artifact::RaceRoute(_) => config.routes.min_bytes,
        }
    }

    pub fn request(&self, config: &Config) -> Result<FetchRequest> {
        Ok(
            FetchRequest::new(self.source_url(config)?, self.destination(config)?)
                .with_minimum_bytes(self.minimum_bytes(config)),
        )
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::TilePackage => f.write_str("tile package"),
            Artifact::RaceRoute(race_id) => write!(f, "route {}", race_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(root: &str) -> Config {
        let mut config = Config::default();
        config.storage.data_dir = Some(PathBuf::from(root).join("data"));
        config.storage.cache_dir = Some(PathBuf::from(root).join("cache"));
        config
    }

    #[test]
    fn test_race_id_accepts_plain_ids() {
        assert_eq!("race-101".parse::<RaceId>().unwrap().as_str(), "race-101");
        assert!("2024_corfu.trail".parse::<RaceId>().is_ok());
    }

    #[test]
    fn test_race_id_rejects_path_tricks() {
        for bad in ["", "..", ".hidden", "a/b", "a\\b", "race 1", "race?x=1"] {
            assert!(bad.parse::<RaceId>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_route_url_from_base() {
        let config = Config::default();
        let artifact = Artifact::RaceRoute("race-101".parse().unwrap());
        assert_eq!(
            artifact.source_url(&config).unwrap(),
            "https://example.com/routes/race-101.gpx"
        );
    }

    #[test]
    fn test_route_url_base_without_trailing_slash() {
        let mut config = Config::default();
        config.routes.base_url = "https://cdn.example.org/tracks".into();
        let artifact = Artifact::RaceRoute("r7".parse().unwrap());
        assert_eq!(
            artifact.source_url(&config).unwrap(),
            "https://cdn.example.org/tracks/r7.gpx"
        );
    }

    #[test]
    fn test_route_url_rejects_invalid_base() {
        let mut config = Config::default();
        config.routes.base_url = "not a url".into();
        let artifact = Artifact::RaceRoute("r7".parse().unwrap());
        assert!(matches!(
            artifact.source_url(&config),
            Err(CmtError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_destinations() {
        let config = config_in("/tmp/cmt-test");
        assert_eq!(
            Artifact::TilePackage.destination(&config).unwrap(),
            PathBuf::from("/tmp/cmt-test/data/maps/corfu.mbtiles")
        );
        assert_eq!(
            Artifact::RaceRoute("race-101".parse().unwrap())
                .destination(&config)
                .unwrap(),
            PathBuf::from("/tmp/cmt-test/cache/routes/race-101.gpx")
        );
    }

    #[test]
    fn test_request_carries_threshold() {
        let mut config = config_in("/tmp/cmt-test");
        config.tiles.min_bytes = 2048;
        let request = Artifact::TilePackage.request(&config).unwrap();

        assert_eq!(request.source_url, "https://example.com/path/to/corfu.mbtiles");
        assert_eq!(request.minimum_valid_bytes, 2048);
    }
}

//! Configuration management for CMT.
//!
//! Configuration is read from `~/.config/cmt/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub network: NetworkConfig,
    pub tiles: TilesConfig,
    pub routes: RoutesConfig,
    pub map: MapConfig,
}

/// Where downloaded artifacts live.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Persistent data directory (default: platform data dir + `cmt`)
    pub data_dir: Option<PathBuf>,
    /// Cache directory for route files (default: platform cache dir + `cmt`)
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Connect timeout in seconds (default: 15)
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds (default: 20)
    pub read_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            read_timeout_secs: 20,
            user_agent: concat!("cmt/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// Offline tile package fetched at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TilesConfig {
    pub url: String,
    /// File name under `<data_dir>/maps/`
    pub file_name: String,
    pub min_bytes: u64,
}

impl Default for TilesConfig {
    fn default() -> Self {
        Self {
            url: "https://example.com/path/to/corfu.mbtiles".to_string(),
            file_name: "corfu.mbtiles".to_string(),
            min_bytes: 1,
        }
    }
}

/// Per-race GPX tracks.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Base URL; a race's track is `<base_url><race_id>.gpx`
    pub base_url: String,
    pub min_bytes: u64,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            base_url: "https://example.com/routes/".to_string(),
            min_bytes: 1,
        }
    }
}

/// Initial map viewport handed to the presentation layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: 39.6243,
            center_lon: 19.9217,
            zoom: 11.0,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/cmt/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("cmt").join("config.toml"))
    }

    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|d| d.join("cmt"))
                .ok_or(ConfigError::NoDataDir),
        }
    }

    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::cache_dir()
                .map(|d| d.join("cmt"))
                .ok_or(ConfigError::NoCacheDir),
        }
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# CMT Configuration

[storage]
# Override where the tile package is kept (default: platform data dir)
# data_dir = "/var/lib/cmt"
# Override where race routes are cached (default: platform cache dir)
# cache_dir = "/var/cache/cmt"

[network]
# Seconds to wait for the connection to be established
connect_timeout_secs = 15
# Seconds to wait between reads of the response body
read_timeout_secs = 20

[tiles]
# Offline MBTiles package downloaded on first start
url = "https://example.com/path/to/corfu.mbtiles"
file_name = "corfu.mbtiles"
# Downloads smaller than this are discarded
min_bytes = 1

[routes]
# A race's GPX track is fetched from <base_url><race_id>.gpx
base_url = "https://example.com/routes/"
min_bytes = 1

[map]
# Initial viewport
center_lat = 39.6243
center_lon = 19.9217
zoom = 11.0
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Could not determine cache directory")]
    NoCacheDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

use crate::types::BoundingBox;

use serde;
use toml;

/// Application-wide configuration shared by the collector and the dashboard.
///
/// Every tunable has a default matching the original deployment over Perak, so
/// running without a config file is equivalent to the fixed-constant setup.
#[derive(Debug, serde::Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub opensky: OpenSkyConfig,
    pub store: StoreConfig,
    pub dashboard: DashboardConfig,
}

impl ApplicationConfig {
    pub fn construct_from_path(
        path: &std::path::PathBuf,
    ) -> Result<ApplicationConfig, errors::ApplicationConfigError> {
        let string =
            std::fs::read_to_string(path).map_err(|error| errors::ApplicationConfigError::Io {
                source: error,
                path: path.clone(),
            })?;

        let config: Result<ApplicationConfig, errors::ApplicationConfigError> =
            toml::from_str(&string).map_err(|error| errors::ApplicationConfigError::Parse {
                source: error,
                path: path.clone(),
            });
        config
    }

    /// Loads the file when a path is given, otherwise falls back to defaults.
    pub fn load_or_default(
        path: Option<&std::path::PathBuf>,
    ) -> Result<ApplicationConfig, errors::ApplicationConfigError> {
        match path {
            Some(path) => ApplicationConfig::construct_from_path(path),
            None => Ok(ApplicationConfig::default()),
        }
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        ApplicationConfig {
            opensky: OpenSkyConfig::default(),
            store: StoreConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(default)]
pub struct OpenSkyConfig {
    pub url: String,
    pub bounding_box: BoundingBox,
    pub poll_interval_seconds: u64,
    pub timeout_seconds: u64,
}

impl Default for OpenSkyConfig {
    fn default() -> Self {
        OpenSkyConfig {
            url: String::from("https://opensky-network.org/api/states/all"),
            bounding_box: BoundingBox {
                min_lat: 3.6,
                max_lat: 6.0,
                min_lon: 100.0,
                max_lon: 101.8,
            },
            poll_interval_seconds: 120,
            timeout_seconds: 15,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: std::path::PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: std::path::PathBuf::from("perak_flight_data.csv"),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub output_path: std::path::PathBuf,
    pub map_path: std::path::PathBuf,
    pub download_file_name: String,
    pub map_center_lat: f64,
    pub map_center_lon: f64,
    pub map_zoom: u8,
    pub refresh_interval_seconds: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            output_path: std::path::PathBuf::from("perak_dashboard.html"),
            map_path: std::path::PathBuf::from("PERAK_RADAR_MAP.html"),
            download_file_name: String::from("perak_flight_logs.csv"),
            map_center_lat: 4.8,
            map_center_lon: 101.0,
            map_zoom: 8,
            refresh_interval_seconds: 30,
        }
    }
}

pub mod errors {

    #[derive(Debug)]
    pub enum ApplicationConfigError {
        Parse {
            source: toml::de::Error,
            path: std::path::PathBuf,
        },
        Io {
            source: std::io::Error,
            path: std::path::PathBuf,
        },
    }
    impl std::fmt::Display for ApplicationConfigError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                ApplicationConfigError::Io {
                    source: error,
                    path,
                } => {
                    write!(
                        f,
                        "Failed to read config file '{}': {}",
                        path.display(),
                        error
                    )
                }
                ApplicationConfigError::Parse {
                    source: error,
                    path,
                } => {
                    write!(
                        f,
                        "Failed to parse config file '{}': {}",
                        path.display(),
                        error
                    )
                }
            }
        }
    }
    impl std::error::Error for ApplicationConfigError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                ApplicationConfigError::Io { source: error, .. } => Some(error),
                ApplicationConfigError::Parse { source: error, .. } => Some(error),
            }
        }
    }
}

pub mod html;

use crate::config::DashboardConfig;
use crate::scheduler::SteppableTask;
use crate::store::{FlatStore, StoreError};
use crate::types::{BoundingBox, Observation};

/// What a render pass found in the flat store.
#[derive(Debug, PartialEq)]
pub enum DashboardState {
    /// The store file does not exist yet; blocking message, nothing rendered.
    StoreMissing,
    /// The store exists but holds no in-box rows; informational message.
    WaitingForData,
    Ready(DashboardData),
}

#[derive(Debug, PartialEq)]
pub struct DashboardData {
    pub metrics: Metrics,
    /// Geofiltered rows in file order.
    pub observations: Vec<Observation>,
    /// One row per distinct aircraft, at its latest capture timestamp.
    pub latest: Vec<Observation>,
}

#[derive(Debug, PartialEq)]
pub struct Metrics {
    pub total_observations: usize,
    pub unique_aircraft: usize,
    /// Timestamp of the chronologically last row in file order.
    pub last_sync: chrono::NaiveDateTime,
}

/// Loads the store and re-applies the geofilter. The collector already
/// filters at write time; this guards against pre-existing or hand-edited
/// files.
pub fn build_state(
    store: &FlatStore,
    bounding_box: BoundingBox,
) -> Result<DashboardState, StoreError> {
    let rows = match store.load() {
        Ok(rows) => rows,
        Err(StoreError::Missing(_)) => return Ok(DashboardState::StoreMissing),
        Err(err) => return Err(err),
    };

    let observations: Vec<Observation> = rows
        .into_iter()
        .filter(|observation| bounding_box.contains(observation.lat, observation.long))
        .collect();

    let Some(last_row) = observations.last() else {
        return Ok(DashboardState::WaitingForData);
    };

    let unique_aircraft = observations
        .iter()
        .map(|observation| observation.icao24)
        .collect::<std::collections::HashSet<_>>()
        .len();

    let metrics = Metrics {
        total_observations: observations.len(),
        unique_aircraft,
        last_sync: last_row.timestamp,
    };
    let latest = latest_per_aircraft(&observations);

    Ok(DashboardState::Ready(DashboardData {
        metrics,
        observations,
        latest,
    }))
}

/// Latest-known position per aircraft: stable ascending sort by capture
/// timestamp, last row per identifier wins, so file order breaks ties.
/// Output is ordered by identifier.
#[must_use]
pub fn latest_per_aircraft(observations: &[Observation]) -> Vec<Observation> {
    let mut sorted = observations.to_vec();
    sorted.sort_by_key(|observation| observation.timestamp);

    let mut latest = std::collections::BTreeMap::new();
    for observation in sorted {
        latest.insert(observation.icao24, observation);
    }
    latest.into_values().collect()
}

/// Table order for the dashboard: newest capture first, stable.
#[must_use]
pub fn newest_first(observations: &[Observation]) -> Vec<Observation> {
    let mut sorted = observations.to_vec();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted
}

/// The renderer task: each step is one full render pass over the store,
/// writing the dashboard document and, when there is data, the standalone
/// map artifact.
pub struct DashboardRenderer {
    store: FlatStore,
    bounding_box: BoundingBox,
    config: DashboardConfig,
}

impl DashboardRenderer {
    #[must_use]
    pub fn new(store: FlatStore, bounding_box: BoundingBox, config: DashboardConfig) -> Self {
        DashboardRenderer {
            store,
            bounding_box,
            config,
        }
    }

    pub fn render_once(&self) -> Result<DashboardState, DashboardError> {
        let state = build_state(&self.store, self.bounding_box).map_err(DashboardError::Store)?;

        let dashboard_document =
            html::render_dashboard_document(&state, &self.config).map_err(DashboardError::Csv)?;
        write_document(&self.config.output_path, &dashboard_document)?;

        if let DashboardState::Ready(data) = &state {
            let map_document = html::render_map_document(&data.latest, &self.config);
            write_document(&self.config.map_path, &map_document)?;
        }

        Ok(state)
    }
}

fn write_document(path: &std::path::Path, contents: &str) -> Result<(), DashboardError> {
    std::fs::write(path, contents).map_err(|error| DashboardError::Io {
        source: error,
        path: path.to_path_buf(),
    })
}

impl SteppableTask for DashboardRenderer {
    fn step(&mut self) -> bool {
        match self.render_once() {
            Ok(DashboardState::StoreMissing) => {
                log::warn!("Store '{}' not found yet.", self.store.path().display());
            }
            Ok(DashboardState::WaitingForData) => {
                log::info!("Waiting for the collector to gather in-box data.");
            }
            Ok(DashboardState::Ready(data)) => {
                log::info!(
                    "Rendered dashboard: {} observations, {} aircraft.",
                    data.metrics.total_observations,
                    data.metrics.unique_aircraft
                );
            }
            Err(err) => log::error!("Render pass failed: {err}"),
        }
        true
    }
}

#[derive(Debug)]
pub enum DashboardError {
    Store(StoreError),
    Csv(csv::Error),
    Io {
        source: std::io::Error,
        path: std::path::PathBuf,
    },
}
impl std::fmt::Display for DashboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardError::Store(error) => write!(f, "{error}"),
            DashboardError::Csv(error) => write!(f, "Failed to serialize table: {error}"),
            DashboardError::Io {
                source: error,
                path,
            } => {
                write!(f, "Failed to write '{}': {}", path.display(), error)
            }
        }
    }
}
impl std::error::Error for DashboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DashboardError::Store(error) => Some(error),
            DashboardError::Csv(error) => Some(error),
            DashboardError::Io { source: error, .. } => Some(error),
        }
    }
}

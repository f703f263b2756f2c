use crate::types::Observation;

/// Append-only CSV file acting as the system's only persistent record.
///
/// The header row is written once, when the file is first created; later
/// appends are headerless. There is no rotation, compaction or locking.
pub struct FlatStore {
    path: std::path::PathBuf,
}

impl FlatStore {
    #[must_use]
    pub fn new(path: std::path::PathBuf) -> Self {
        FlatStore { path }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Appends the given observations, writing the header only if the file
    /// does not yet exist. Appending nothing is a no-op and never creates
    /// the file.
    pub fn append(&self, observations: &[Observation]) -> Result<usize, StoreError> {
        if observations.is_empty() {
            return Ok(0);
        }

        let write_header = !self.exists();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|error| StoreError::Io {
                source: error,
                path: self.path.clone(),
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        for observation in observations {
            writer.serialize(observation).map_err(|error| StoreError::Csv {
                source: error,
                path: self.path.clone(),
            })?;
        }
        writer.flush().map_err(|error| StoreError::Io {
            source: error,
            path: self.path.clone(),
        })?;

        Ok(observations.len())
    }

    /// Loads the whole file in row order.
    pub fn load(&self) -> Result<Vec<Observation>, StoreError> {
        if !self.exists() {
            return Err(StoreError::Missing(self.path.clone()));
        }

        let mut reader =
            csv::Reader::from_path(&self.path).map_err(|error| StoreError::Csv {
                source: error,
                path: self.path.clone(),
            })?;

        reader
            .deserialize::<Observation>()
            .map(|row| {
                row.map_err(|error| StoreError::Csv {
                    source: error,
                    path: self.path.clone(),
                })
            })
            .collect()
    }
}

/// Serializes a row set to CSV text with a header, the same shape the store
/// itself uses. This backs the dashboard's download affordance.
pub fn to_csv_string(observations: &[Observation]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(vec![]);
    for observation in observations {
        writer.serialize(observation)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|error| error.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[derive(Debug)]
pub enum StoreError {
    Missing(std::path::PathBuf),
    Io {
        source: std::io::Error,
        path: std::path::PathBuf,
    },
    Csv {
        source: csv::Error,
        path: std::path::PathBuf,
    },
}
impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Missing(path) => {
                write!(f, "Store file '{}' does not exist", path.display())
            }
            StoreError::Io {
                source: error,
                path,
            } => {
                write!(f, "Failed to access store '{}': {}", path.display(), error)
            }
            StoreError::Csv {
                source: error,
                path,
            } => {
                write!(
                    f,
                    "Failed to (de)serialize store '{}': {}",
                    path.display(),
                    error
                )
            }
        }
    }
}
impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Missing(_) => None,
            StoreError::Io { source: error, .. } => Some(error),
            StoreError::Csv { source: error, .. } => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FlatStore, StoreError, to_csv_string};
    use crate::types::{Icao24, Observation};

    fn observation(icao24: u32, hour: u32) -> Observation {
        Observation {
            icao24: Icao24::new(icao24).unwrap(),
            callsign: String::from("AXM123  "),
            origin: String::from("Malaysia"),
            time_pos: Some(1_700_000_000),
            last_con: Some(1_700_000_010),
            long: 101.0,
            lat: 4.8,
            altitude: Some(10_668.0),
            timestamp: chrono::NaiveDate::from_ymd_opt(2026, 1, 2)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> FlatStore {
        FlatStore::new(dir.path().join("data.csv"))
    }

    #[test]
    fn when_appending_across_multiple_cycles_then_header_appears_exactly_once() {
        let dir = tempfile::tempdir().expect("Test should pass");
        let store = store_in(&dir);

        store
            .append(&[observation(1, 1), observation(2, 1)])
            .expect("Test should pass");
        store.append(&[observation(3, 2)]).expect("Test should pass");

        let contents = std::fs::read_to_string(store.path()).expect("Test should pass");
        let header_count = contents.matches("icao24,callsign").count();
        assert_eq!(header_count, 1);
        assert_eq!(contents.lines().count(), 4); // header + 3 rows
    }

    #[test]
    fn when_appending_zero_observations_then_no_file_and_no_header_are_created() {
        let dir = tempfile::tempdir().expect("Test should pass");
        let store = store_in(&dir);

        let written = store.append(&[]).expect("Test should pass");

        assert_eq!(written, 0);
        assert!(!store.exists());
    }

    #[test]
    fn when_loading_appended_rows_then_values_round_trip() {
        let dir = tempfile::tempdir().expect("Test should pass");
        let store = store_in(&dir);
        let expected = vec![observation(0xAB_CDEF, 1), observation(0x12_3456, 2)];

        store.append(&expected).expect("Test should pass");
        let loaded = store.load().expect("Test should pass");

        assert_eq!(loaded, expected);
    }

    #[test]
    fn when_loading_missing_file_then_missing_error_is_returned() {
        let dir = tempfile::tempdir().expect("Test should pass");
        let store = store_in(&dir);

        let result = store.load();

        assert!(matches!(result, Err(StoreError::Missing(_))));
    }

    #[test]
    fn when_serializing_to_csv_string_then_reparsing_reproduces_the_rows() {
        let rows = vec![observation(1, 1), observation(2, 2)];

        let csv_string = to_csv_string(&rows).expect("Test should pass");
        let mut reader = csv::Reader::from_reader(csv_string.as_bytes());
        let reparsed: Vec<Observation> = reader
            .deserialize()
            .collect::<Result<_, _>>()
            .expect("Test should pass");

        assert_eq!(reparsed, rows);
    }
}

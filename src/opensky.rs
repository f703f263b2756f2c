use crate::config::OpenSkyConfig;
use crate::types::{BoundingBox, Icao24, Icao24Error, Observation};

/// Seam between the acquisition loop and the remote endpoint, so cycle
/// behaviour can be exercised without a network.
pub trait StateProvider {
    fn fetch(
        &self,
        captured_at: chrono::NaiveDateTime,
    ) -> Result<Vec<Observation>, OpenSkyError>;
}

/// Client for the OpenSky `states/all` endpoint, queried with a fixed
/// bounding box and timeout.
pub struct StateQueryClient {
    agent: ureq::Agent,
    url: String,
    bounding_box: BoundingBox,
}

impl StateQueryClient {
    #[must_use]
    pub fn new(config: &OpenSkyConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build();
        StateQueryClient {
            agent,
            url: config.url.clone(),
            bounding_box: config.bounding_box,
        }
    }
}

impl StateProvider for StateQueryClient {
    fn fetch(
        &self,
        captured_at: chrono::NaiveDateTime,
    ) -> Result<Vec<Observation>, OpenSkyError> {
        let response = self
            .agent
            .get(&self.url)
            .query("lamin", &self.bounding_box.min_lat.to_string())
            .query("lomin", &self.bounding_box.min_lon.to_string())
            .query("lamax", &self.bounding_box.max_lat.to_string())
            .query("lomax", &self.bounding_box.max_lon.to_string())
            .call()
            .map_err(|error| match error {
                ureq::Error::Status(code, _) => OpenSkyError::Status(code),
                other => OpenSkyError::Transport(Box::new(other)),
            })?;

        let body: StatesResponse = response.into_json().map_err(OpenSkyError::Payload)?;

        Ok(normalize_states(&body.states.unwrap_or_default(), captured_at))
    }
}

/// Top-level shape of the endpoint's JSON body. `states` is null when no
/// aircraft match the query.
#[derive(Debug, serde::Deserialize)]
struct StatesResponse {
    states: Option<Vec<Vec<serde_json::Value>>>,
}

/// Maps each raw state vector onto an [`Observation`], keeping only the first
/// eight positional fields. Rows without a usable identifier or coordinates
/// are discarded with a debug log; they could never pass the geofilter.
#[must_use]
pub fn normalize_states(
    states: &[Vec<serde_json::Value>],
    captured_at: chrono::NaiveDateTime,
) -> Vec<Observation> {
    states
        .iter()
        .filter_map(|state| match observation_from_state(state, captured_at) {
            Ok(observation) => Some(observation),
            Err(err) => {
                log::debug!("Discarding state vector: {err}");
                None
            }
        })
        .collect()
}

pub fn observation_from_state(
    state: &[serde_json::Value],
    captured_at: chrono::NaiveDateTime,
) -> Result<Observation, StateVectorError> {
    if state.len() < 8 {
        return Err(StateVectorError::TooShort(state.len()));
    }

    let icao24: Icao24 = state[0]
        .as_str()
        .ok_or(StateVectorError::MissingIdentifier)?
        .parse()
        .map_err(StateVectorError::InvalidIdentifier)?;

    let long = state[5].as_f64().ok_or(StateVectorError::MissingCoordinates)?;
    let lat = state[6].as_f64().ok_or(StateVectorError::MissingCoordinates)?;

    Ok(Observation {
        icao24,
        callsign: state[1].as_str().unwrap_or("").to_string(),
        origin: state[2].as_str().unwrap_or("").to_string(),
        time_pos: state[3].as_i64(),
        last_con: state[4].as_i64(),
        long,
        lat,
        altitude: state[7].as_f64(),
        timestamp: captured_at,
    })
}

#[derive(Debug)]
pub enum OpenSkyError {
    Transport(Box<ureq::Error>),
    Status(u16),
    Payload(std::io::Error),
}
impl std::fmt::Display for OpenSkyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpenSkyError::Transport(error) => write!(f, "Connection error: {error}"),
            OpenSkyError::Status(code) => write!(f, "API error: {code}"),
            OpenSkyError::Payload(error) => write!(f, "Malformed payload: {error}"),
        }
    }
}
impl std::error::Error for OpenSkyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OpenSkyError::Transport(error) => Some(error),
            OpenSkyError::Status(_) => None,
            OpenSkyError::Payload(error) => Some(error),
        }
    }
}

#[derive(Debug)]
pub enum StateVectorError {
    TooShort(usize),
    MissingIdentifier,
    InvalidIdentifier(Icao24Error),
    MissingCoordinates,
}
impl std::fmt::Display for StateVectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateVectorError::TooShort(len) => {
                write!(f, "State vector has {len} fields, expected at least 8")
            }
            StateVectorError::MissingIdentifier => write!(f, "Missing ICAO24 identifier"),
            StateVectorError::InvalidIdentifier(error) => write!(f, "{error}"),
            StateVectorError::MissingCoordinates => write!(f, "Missing longitude or latitude"),
        }
    }
}
impl std::error::Error for StateVectorError {}

#[cfg(test)]
mod tests {
    use super::{StateVectorError, normalize_states, observation_from_state};

    fn capture_time() -> chrono::NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    #[test]
    fn when_state_vector_is_complete_then_first_eight_fields_are_mapped() {
        let state = serde_json::json!([
            "ab12cd",
            "AXM123  ",
            "Malaysia",
            1_700_000_000_i64,
            1_700_000_010_i64,
            100.5,
            4.2,
            10_668.0,
            // trailing fields past position 8 are ignored
            123.4,
            false
        ]);

        let observation =
            observation_from_state(state.as_array().unwrap(), capture_time())
                .expect("Test should pass");

        assert_eq!(observation.icao24.to_string(), "ab12cd");
        assert_eq!(observation.callsign, "AXM123  ");
        assert_eq!(observation.origin, "Malaysia");
        assert_eq!(observation.time_pos, Some(1_700_000_000));
        assert_eq!(observation.last_con, Some(1_700_000_010));
        assert_eq!(observation.long, 100.5);
        assert_eq!(observation.lat, 4.2);
        assert_eq!(observation.altitude, Some(10_668.0));
        assert_eq!(observation.timestamp, capture_time());
    }

    #[test]
    fn when_nullable_fields_are_null_then_they_map_to_none_or_empty() {
        let state = serde_json::json!([
            "ab12cd", null, "Malaysia", null, null, 100.5, 4.2, null
        ]);

        let observation =
            observation_from_state(state.as_array().unwrap(), capture_time())
                .expect("Test should pass");

        assert_eq!(observation.callsign, "");
        assert_eq!(observation.time_pos, None);
        assert_eq!(observation.last_con, None);
        assert_eq!(observation.altitude, None);
    }

    #[test]
    fn when_state_vector_is_too_short_then_error_is_returned() {
        let state = serde_json::json!(["ab12cd", "AXM123", "Malaysia"]);
        let result = observation_from_state(state.as_array().unwrap(), capture_time());
        assert!(matches!(result, Err(StateVectorError::TooShort(3))));
    }

    #[test]
    fn when_coordinates_are_null_then_row_is_rejected() {
        let state = serde_json::json!([
            "ab12cd", "AXM123", "Malaysia", null, null, null, 4.2, null
        ]);
        let result = observation_from_state(state.as_array().unwrap(), capture_time());
        assert!(matches!(result, Err(StateVectorError::MissingCoordinates)));
    }

    #[test]
    fn when_normalizing_mixed_rows_then_bad_rows_are_dropped_silently() {
        let states = vec![
            serde_json::json!(["ab12cd", "A", "X", null, null, 100.5, 4.2, null])
                .as_array()
                .unwrap()
                .clone(),
            serde_json::json!(["not-hex", "B", "Y", null, null, 100.6, 4.3, null])
                .as_array()
                .unwrap()
                .clone(),
            serde_json::json!(["ef34ab", "C", "Z", null, null, null, null, null])
                .as_array()
                .unwrap()
                .clone(),
        ];

        let observations = normalize_states(&states, capture_time());

        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].icao24.to_string(), "ab12cd");
    }
}

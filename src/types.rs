/// A single aircraft state observation as written to the flat store.
///
/// Field order matches the store's CSV header:
/// `icao24,callsign,origin,time_pos,last_con,long,lat,altitude,timestamp`.
#[derive(Debug, PartialEq, Clone, serde::Serialize, serde::Deserialize)]
pub struct Observation {
    pub icao24: Icao24,
    pub callsign: String,
    pub origin: String,
    pub time_pos: Option<i64>,
    pub last_con: Option<i64>,
    pub long: f64,
    pub lat: f64,
    pub altitude: Option<f64>,
    #[serde(with = "timestamp_format")]
    pub timestamp: chrono::NaiveDateTime,
}

/// Wall-clock capture timestamps are stored with second precision.
pub mod timestamp_format {
    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(
        datetime: &chrono::NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&datetime.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<chrono::NaiveDateTime, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let string: String = serde::Deserialize::deserialize(deserializer)?;
        chrono::NaiveDateTime::parse_from_str(&string, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Rectangular geographic filter in degrees.
#[derive(Debug, PartialEq, Clone, Copy, serde::Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash, PartialOrd, Ord)]
pub struct Icao24(u32);

impl Icao24 {
    pub const MAX_VALUE: u32 = 0x00FF_FFFF;

    pub fn new(value: u32) -> Result<Self, Icao24Error> {
        if value <= Self::MAX_VALUE {
            Ok(Icao24(value))
        } else {
            Err(Icao24Error::InvalidAddress(value))
        }
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Icao24 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06x}", self.0)
    }
}

impl std::str::FromStr for Icao24 {
    type Err = Icao24Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = u32::from_str_radix(s.trim(), 16)
            .map_err(|_| Icao24Error::InvalidHexFormat(s.to_string()))?;
        Icao24::new(value)
    }
}

impl serde::Serialize for Icao24 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Icao24 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let string: String = serde::Deserialize::deserialize(deserializer)?;
        string.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug)]
pub enum Icao24Error {
    InvalidHexFormat(String),
    InvalidAddress(u32),
}
impl std::fmt::Display for Icao24Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Icao24Error::InvalidHexFormat(string) => {
                write!(f, "'{string}' is not a hexadecimal identifier")
            }
            Icao24Error::InvalidAddress(val) => {
                write!(
                    f,
                    "Value 0x{:X} ({}) exceeds 24-bit ICAO address limit (0x{:X})",
                    val,
                    val,
                    Icao24::MAX_VALUE
                )
            }
        }
    }
}
impl std::error::Error for Icao24Error {}

#[cfg(test)]
mod tests {
    use super::{BoundingBox, Icao24, Observation};

    #[test]
    fn when_parsing_valid_hex_string_then_icao24_round_trips_through_display() {
        let icao24: Icao24 = "ab12cd".parse().expect("Test should pass");
        assert_eq!(icao24.value(), 0x00AB_12CD);
        assert_eq!(icao24.to_string(), "ab12cd");
    }

    #[test]
    fn when_parsing_non_hex_string_then_error_is_returned() {
        let result = "zzzzzz".parse::<Icao24>();
        assert!(result.is_err());
    }

    #[test]
    fn when_value_exceeds_24_bits_then_error_is_returned() {
        let result = Icao24::new(0x0100_0000);
        assert!(result.is_err());
    }

    #[test]
    fn when_coordinates_are_on_box_edges_then_contains_is_inclusive() {
        let bounding_box = BoundingBox {
            min_lat: 3.6,
            max_lat: 6.0,
            min_lon: 100.0,
            max_lon: 101.8,
        };
        assert!(bounding_box.contains(3.6, 100.0));
        assert!(bounding_box.contains(6.0, 101.8));
        assert!(bounding_box.contains(4.8, 101.0));
        assert!(!bounding_box.contains(3.599, 101.0));
        assert!(!bounding_box.contains(4.8, 101.801));
    }

    #[test]
    fn when_serializing_observation_then_timestamp_uses_wall_clock_format() {
        let observation = Observation {
            icao24: Icao24::new(0x00AB_CDEF).unwrap(),
            callsign: String::from("MAS370  "),
            origin: String::from("Malaysia"),
            time_pos: Some(1_700_000_000),
            last_con: None,
            long: 101.0,
            lat: 4.8,
            altitude: Some(11_000.0),
            timestamp: chrono::NaiveDate::from_ymd_opt(2026, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap(),
        };

        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(&observation).expect("Test should pass");
        let bytes = writer.into_inner().expect("Test should pass");
        let string = String::from_utf8(bytes).expect("Test should pass");

        assert!(string
            .starts_with("icao24,callsign,origin,time_pos,last_con,long,lat,altitude,timestamp"));
        assert!(string.contains("2026-01-02 03:04:05"));
        assert!(string.contains("abcdef"));
    }
}

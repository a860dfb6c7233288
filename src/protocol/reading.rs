//! Sensor reading payloads published over MQTT
//!
//! Every reading serializes to a flat JSON object carrying `sensor_id`,
//! `timestamp`, `location` and the kind-specific measurements. Measurements
//! are either a single numeric field or a named group nested one level deep.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Wire format of reading timestamps: ISO-8601 UTC with second precision
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One measurement snapshot produced by a sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: String,
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub measurements: Measurements,
    pub location: String,
}

impl Reading {
    /// Build a reading, truncating the timestamp to whole seconds
    pub fn new(
        sensor_id: impl Into<String>,
        location: impl Into<String>,
        timestamp: DateTime<Utc>,
        measurements: Measurements,
    ) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            timestamp: timestamp.trunc_subsecs(0),
            measurements,
            location: location.into(),
        }
    }

    /// Timestamp rendered in the wire format
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Serialize to the JSON payload sent to the broker
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Kind-specific measurement payloads
///
/// Variants are distinguished on the wire by their top-level key, so the
/// enum is untagged and flattened into [`Reading`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measurements {
    Particulates { pm: Particulates },
    AirQuality { iaq: AirQuality },
    CarbonDioxide { co2: CarbonDioxide },
    Formaldehyde { hcho: Formaldehyde },
    Environment { environment: Environment },
    Temperature { temperature: f64 },
}

impl Measurements {
    /// Name of the top-level JSON key holding the measurements
    pub fn group_key(&self) -> &'static str {
        match self {
            Measurements::Particulates { .. } => "pm",
            Measurements::AirQuality { .. } => "iaq",
            Measurements::CarbonDioxide { .. } => "co2",
            Measurements::Formaldehyde { .. } => "hcho",
            Measurements::Environment { .. } => "environment",
            Measurements::Temperature { .. } => "temperature",
        }
    }
}

/// Particulate matter concentrations (µg/m³) and particle counts per 0.1 L
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particulates {
    pub pm1_0: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub particles_0_3um: u32,
    pub particles_0_5um: u32,
    pub particles_1_0um: u32,
    pub particles_2_5um: u32,
    pub particles_5_0um: u32,
    pub particles_10um: u32,
}

/// Indoor air quality: VOC index, equivalent CO₂ and ambient conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub voc_index: u32,
    pub eco2: u32,
    pub temperature: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonDioxide {
    pub ppm: u32,
    pub temperature: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formaldehyde {
    pub ppm: f64,
    pub temperature: f64,
    pub humidity: f64,
}

/// Temperature (°C), relative humidity (%) and pressure (hPa)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&timestamp.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

/// Parse a wire-format timestamp
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
}

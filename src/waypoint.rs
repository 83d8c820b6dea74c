//! Turns the trip-planning service payload into an ordered waypoint list.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{InvalidOriginError, InvalidWaypointError};
use crate::geo::{Axis, GeoCoordinate};

/// A coordinate field as it arrives from upstream: a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    Number(f64),
    Text(String),
}

impl CoordinateValue {
    /// Strict numeric parse; surrounding whitespace is tolerated, trailing garbage is not.
    pub fn to_f64(&self) -> Option<f64> {
        let value = match self {
            CoordinateValue::Number(value) => *value,
            CoordinateValue::Text(raw) => raw.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Keeps anything that is neither a number nor a string as its JSON text,
    /// so it fails later as an unparsable coordinate instead of failing the
    /// whole payload.
    fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(number) => number.as_f64().map(CoordinateValue::Number),
            Value::String(raw) => Some(CoordinateValue::Text(raw)),
            other => Some(CoordinateValue::Text(other.to_string())),
        }
    }

    fn raw(&self) -> String {
        match self {
            CoordinateValue::Number(value) => value.to_string(),
            CoordinateValue::Text(raw) => raw.clone(),
        }
    }
}

impl From<f64> for CoordinateValue {
    fn from(value: f64) -> Self {
        CoordinateValue::Number(value)
    }
}

impl From<&str> for CoordinateValue {
    fn from(value: &str) -> Self {
        CoordinateValue::Text(value.to_string())
    }
}

/// Reads a coordinate field of any JSON type; `null` or absent is `None`.
pub(crate) fn lenient_coordinate<'de, D>(
    deserializer: D,
) -> Result<Option<CoordinateValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(CoordinateValue::from_json(Value::deserialize(deserializer)?))
}

/// Reads a duration written as `45`, `45.5`, `"45 min"` or `"123.4 minutes"`.
/// Anything unreadable is `None`.
pub(crate) fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let minutes = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => parse_minutes(&raw),
        _ => None,
    };
    Ok(minutes.filter(|minutes| minutes.is_finite() && *minutes >= 0.0))
}

/// Reads the stop list, keeping every entry so the sequencer can judge it.
pub(crate) fn lenient_stops<'de, D>(deserializer: D) -> Result<Vec<RawStop>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().map(RawStop::from_json).collect(),
        Value::Null => Vec::new(),
        other => {
            debug!(stops = %other, "stops is not a list, ignoring");
            Vec::new()
        }
    })
}

/// Leading number of a duration string, in minutes. An hour unit
/// (`"1.5 h"`, `"2 hours"`) is converted.
pub fn parse_minutes(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let end = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(raw.len());
    let value: f64 = raw[..end].parse().ok()?;
    let unit = raw[end..].trim_start();
    if unit.starts_with(['h', 'H']) {
        Some(value * 60.0)
    } else {
        Some(value)
    }
}

/// Display data attached to a stop. Carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopMetadata {
    pub name: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub activities: Vec<String>,
    pub interest: Option<String>,
    /// Minutes spent at the stop.
    #[serde(deserialize_with = "lenient_minutes")]
    pub visit_duration: Option<f64>,
}

/// One stop record as produced by the trip-planning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStop {
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub latitude: Option<CoordinateValue>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub longitude: Option<CoordinateValue>,
    #[serde(flatten)]
    pub metadata: StopMetadata,
}

impl RawStop {
    pub fn new(
        latitude: impl Into<CoordinateValue>,
        longitude: impl Into<CoordinateValue>,
    ) -> Self {
        Self {
            latitude: Some(latitude.into()),
            longitude: Some(longitude.into()),
            metadata: StopMetadata::default(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.metadata.name = Some(name.to_string());
        self
    }

    pub fn with_visit_duration(mut self, minutes: f64) -> Self {
        self.metadata.visit_duration = Some(minutes);
        self
    }

    /// Reads one upstream stop record. Metadata that does not fit the
    /// expected shape is dropped rather than rejecting the stop.
    pub fn from_json(value: Value) -> Self {
        match RawStop::deserialize(&value) {
            Ok(stop) => stop,
            Err(err) => {
                debug!(error = %err, "unreadable stop metadata, keeping coordinates only");
                let field = |name: &str| {
                    value.get(name).cloned().and_then(CoordinateValue::from_json)
                };
                Self {
                    latitude: field("latitude"),
                    longitude: field("longitude"),
                    metadata: StopMetadata {
                        name: value.get("name").and_then(Value::as_str).map(str::to_string),
                        ..StopMetadata::default()
                    },
                }
            }
        }
    }
}

/// Whether the trip ends at the last stop or returns to the origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteShape {
    OneWay,
    #[default]
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WaypointRole {
    Origin,
    Stop,
    Return,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    pub coordinate: GeoCoordinate,
    pub role: WaypointRole,
    pub sequence_index: usize,
    pub metadata: Option<StopMetadata>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WaypointSequencer {
    shape: RouteShape,
}

impl WaypointSequencer {
    pub fn new(shape: RouteShape) -> Self {
        Self { shape }
    }

    /// Builds `[origin, stops.., (return)]` with contiguous sequence indices.
    ///
    /// An unusable origin aborts; unusable stops are skipped. A loop with no
    /// surviving stops is just the origin.
    pub fn sequence(
        &self,
        origin_latitude: Option<&CoordinateValue>,
        origin_longitude: Option<&CoordinateValue>,
        stops: &[RawStop],
    ) -> Result<Vec<Waypoint>, InvalidOriginError> {
        let origin = parse_origin(origin_latitude, origin_longitude)?;

        let mut waypoints = Vec::with_capacity(stops.len() + 2);
        waypoints.push(Waypoint {
            coordinate: origin,
            role: WaypointRole::Origin,
            sequence_index: 0,
            metadata: None,
        });

        for (index, stop) in stops.iter().enumerate() {
            match parse_stop(index, stop) {
                Ok(coordinate) => waypoints.push(Waypoint {
                    coordinate,
                    role: WaypointRole::Stop,
                    sequence_index: waypoints.len(),
                    metadata: Some(stop.metadata.clone()),
                }),
                Err(err) => debug!(error = %err, "dropping stop"),
            }
        }

        if self.shape == RouteShape::Loop && waypoints.len() > 1 {
            waypoints.push(Waypoint {
                coordinate: origin,
                role: WaypointRole::Return,
                sequence_index: waypoints.len(),
                metadata: None,
            });
        }

        Ok(waypoints)
    }
}

fn parse_origin(
    latitude: Option<&CoordinateValue>,
    longitude: Option<&CoordinateValue>,
) -> Result<GeoCoordinate, InvalidOriginError> {
    let lat = parse_origin_axis(latitude, Axis::Latitude)?;
    let lng = parse_origin_axis(longitude, Axis::Longitude)?;
    GeoCoordinate::new(lat, lng).map_err(InvalidOriginError::OutOfRange)
}

fn parse_origin_axis(
    value: Option<&CoordinateValue>,
    axis: Axis,
) -> Result<f64, InvalidOriginError> {
    let value = value.ok_or(InvalidOriginError::Missing(axis))?;
    value.to_f64().ok_or_else(|| InvalidOriginError::Unparsable {
        axis,
        raw: value.raw(),
    })
}

fn parse_stop(index: usize, stop: &RawStop) -> Result<GeoCoordinate, InvalidWaypointError> {
    let lat = stop
        .latitude
        .as_ref()
        .and_then(CoordinateValue::to_f64)
        .ok_or(InvalidWaypointError::Unparsable {
            index,
            axis: Axis::Latitude,
        })?;
    let lng = stop
        .longitude
        .as_ref()
        .and_then(CoordinateValue::to_f64)
        .ok_or(InvalidWaypointError::Unparsable {
            index,
            axis: Axis::Longitude,
        })?;
    GeoCoordinate::new(lat, lng).map_err(|axis| InvalidWaypointError::OutOfRange { index, axis })
}

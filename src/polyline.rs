//! Encoded polyline codec for route geometries.
//!
//! Routing providers return leg geometry in the compact polyline format:
//! each point is stored as a latitude delta followed by a longitude delta,
//! every delta zig-zag encoded and split into 5-bit chunks offset by 63.
//! Decoding happens once per leg at the provider boundary; everything past
//! the fetcher works with [`Polyline`] values.

use serde::Serialize;

use crate::error::MalformedPolylineError;
use crate::geo::GeoCoordinate;

/// Standard precision (five decimal places).
pub const PRECISION_5: f64 = 1e-5;

/// Precision used by `polyline6` geometries.
pub const PRECISION_6: f64 = 1e-6;

const CHAR_OFFSET: u8 = 63;
const CHUNK_MASK: u64 = 0x1f;
const CONTINUATION_BIT: u64 = 0x20;

/// A route geometry as decoded, validated coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polyline {
    points: Vec<GeoCoordinate>,
}

impl Polyline {
    pub fn new(points: Vec<GeoCoordinate>) -> Self {
        Self { points }
    }

    /// Decodes `encoded` at the given precision.
    pub fn decode(encoded: &str, precision: f64) -> Result<Self, MalformedPolylineError> {
        decode_with_precision(encoded, precision).map(Self::new)
    }

    pub fn encode(&self, precision: f64) -> String {
        encode_with_precision(&self.points, precision)
    }

    pub fn points(&self) -> &[GeoCoordinate] {
        &self.points
    }

    pub fn into_points(self) -> Vec<GeoCoordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Decodes at [`PRECISION_5`].
pub fn decode(encoded: &str) -> Result<Vec<GeoCoordinate>, MalformedPolylineError> {
    decode_with_precision(encoded, PRECISION_5)
}

/// Encodes at [`PRECISION_5`].
pub fn encode(points: &[GeoCoordinate]) -> String {
    encode_with_precision(points, PRECISION_5)
}

pub fn decode_with_precision(
    encoded: &str,
    precision: f64,
) -> Result<Vec<GeoCoordinate>, MalformedPolylineError> {
    let factor = scale_factor(precision);
    let bytes = encoded.as_bytes();
    let mut points = Vec::with_capacity(bytes.len() / 4);
    let mut position = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while position < bytes.len() {
        lat = lat.wrapping_add(read_delta(bytes, &mut position)?);
        // A latitude without its longitude is a truncated point.
        if position >= bytes.len() {
            return Err(MalformedPolylineError::Truncated { position });
        }
        lng = lng.wrapping_add(read_delta(bytes, &mut position)?);

        let index = points.len();
        let point = GeoCoordinate::new(lat as f64 / factor, lng as f64 / factor)
            .map_err(|_| MalformedPolylineError::CoordinateOutOfRange { index })?;
        points.push(point);
    }

    Ok(points)
}

pub fn encode_with_precision(points: &[GeoCoordinate], precision: f64) -> String {
    let factor = scale_factor(precision);
    let mut encoded = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.latitude() * factor).round() as i64;
        let lng = (point.longitude() * factor).round() as i64;
        write_delta(&mut encoded, lat - prev_lat);
        write_delta(&mut encoded, lng - prev_lng);
        prev_lat = lat;
        prev_lng = lng;
    }

    encoded
}

/// Integer scale for a precision, e.g. `1e-5 -> 100_000.0`.
///
/// Dividing by the rounded factor keeps decoded values at the nearest
/// representable decimal instead of accumulating `x * 1e-5` error.
fn scale_factor(precision: f64) -> f64 {
    (1.0 / precision).round()
}

fn read_delta(bytes: &[u8], position: &mut usize) -> Result<i64, MalformedPolylineError> {
    let start = *position;
    let mut value: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let Some(&byte) = bytes.get(*position) else {
            return Err(MalformedPolylineError::Truncated { position: *position });
        };
        if byte < CHAR_OFFSET || byte > 127 {
            return Err(MalformedPolylineError::InvalidCharacter {
                position: *position,
                byte,
            });
        }
        if shift >= u64::BITS {
            return Err(MalformedPolylineError::Overflow { position: start });
        }

        let chunk = u64::from(byte - CHAR_OFFSET);
        value |= (chunk & CHUNK_MASK) << shift;
        shift += 5;
        *position += 1;

        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
    }

    let delta = if value & 1 != 0 {
        !(value >> 1) as i64
    } else {
        (value >> 1) as i64
    };
    Ok(delta)
}

fn write_delta(out: &mut String, delta: i64) {
    let mut value = (delta << 1) as u64;
    if delta < 0 {
        value = !value;
    }

    while value >= CONTINUATION_BIT {
        out.push(char::from(
            ((CONTINUATION_BIT | (value & CHUNK_MASK)) as u8) + CHAR_OFFSET,
        ));
        value >>= 5;
    }
    out.push(char::from(value as u8 + CHAR_OFFSET));
}

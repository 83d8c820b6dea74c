//! Geographic primitives shared by every stage of route assembly.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// A validated latitude/longitude pair in decimal degrees.
///
/// Can only be built through [`GeoCoordinate::new`], so every instance is
/// finite and inside the valid ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoCoordinate {
    latitude: f64,
    longitude: f64,
}

/// Which axis of a coordinate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Latitude => f.write_str("latitude"),
            Axis::Longitude => f.write_str("longitude"),
        }
    }
}

impl GeoCoordinate {
    /// Returns the offending axis when either value is non-finite or out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, Axis> {
        if !latitude.is_finite() || !(MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
            return Err(Axis::Latitude);
        }
        if !longitude.is_finite() || !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude) {
            return Err(Axis::Longitude);
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl Display for GeoCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}, {}", self.latitude, self.longitude))
    }
}

impl From<GeoCoordinate> for (f64, f64) {
    fn from(value: GeoCoordinate) -> Self {
        (value.latitude, value.longitude)
    }
}

impl TryFrom<(f64, f64)> for GeoCoordinate {
    type Error = Axis;

    fn try_from((latitude, longitude): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(latitude, longitude)
    }
}

/// Axis-aligned viewport in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn contains(&self, coordinate: &GeoCoordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&coordinate.latitude())
            && (self.min_lon..=self.max_lon).contains(&coordinate.longitude())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinate() {
        let coordinate = GeoCoordinate::new(9.9195, 78.1193).unwrap();
        assert_eq!(coordinate.latitude(), 9.9195);
        assert_eq!(coordinate.longitude(), 78.1193);
    }

    #[test]
    fn test_range_edges_are_valid() {
        assert!(GeoCoordinate::new(90.0, 180.0).is_ok());
        assert!(GeoCoordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(GeoCoordinate::new(90.5, 0.0), Err(Axis::Latitude));
        assert_eq!(GeoCoordinate::new(0.0, -180.01), Err(Axis::Longitude));
    }

    #[test]
    fn test_rejects_non_finite() {
        assert_eq!(GeoCoordinate::new(f64::NAN, 0.0), Err(Axis::Latitude));
        assert_eq!(GeoCoordinate::new(0.0, f64::INFINITY), Err(Axis::Longitude));
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = Bounds {
            min_lat: 10.0,
            max_lat: 11.0,
            min_lon: 20.0,
            max_lon: 21.0,
        };
        assert!(bounds.contains(&GeoCoordinate::new(10.5, 20.5).unwrap()));
        assert!(!bounds.contains(&GeoCoordinate::new(11.5, 20.5).unwrap()));
        assert_eq!(bounds.center(), (10.5, 20.5));
    }
}

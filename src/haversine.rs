//! Straight-line leg provider (fallback when no routing server is reachable).
//!
//! Uses great-circle distance to estimate travel time and returns the chord
//! between the two waypoints as the leg geometry. Less accurate than a real
//! router (ignores roads) but always available.

use crate::error::LegFetchError;
use crate::geo::GeoCoordinate;
use crate::polyline;
use crate::traits::{LegRoute, LegRouteProvider};

/// Average travel speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone)]
pub struct HaversineProvider {
    /// Assumed average travel speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineProvider {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineProvider {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Great-circle distance between two points in kilometers.
    pub fn haversine_km(from: GeoCoordinate, to: GeoCoordinate) -> f64 {
        let lat1_rad = from.latitude().to_radians();
        let lat2_rad = to.latitude().to_radians();
        let delta_lat = (to.latitude() - from.latitude()).to_radians();
        let delta_lng = (to.longitude() - from.longitude()).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    fn km_to_seconds(&self, km: f64) -> f64 {
        (km / self.speed_kmh * 3600.0).round()
    }
}

impl LegRouteProvider for HaversineProvider {
    async fn route_leg(
        &self,
        from: GeoCoordinate,
        to: GeoCoordinate,
    ) -> Result<LegRoute, LegFetchError> {
        let km = Self::haversine_km(from, to);
        Ok(LegRoute {
            encoded_geometry: polyline::encode(&[from, to]),
            distance_meters: Some((km * 1000.0).round()),
            duration_seconds: Some(self.km_to_seconds(km)),
        })
    }
}

#[cfg(test)]
mod tests {
    use futures_util::FutureExt;

    use super::*;

    fn point(lat: f64, lng: f64) -> GeoCoordinate {
        GeoCoordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = HaversineProvider::haversine_km(point(9.92, 78.12), point(9.92, 78.12));
        assert!(dist < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Madurai (9.925, 78.120) to Chennai (13.083, 80.270), ~ 425 km
        let dist = HaversineProvider::haversine_km(point(9.925, 78.12), point(13.083, 80.27));
        assert!(dist > 400.0 && dist < 450.0, "Madurai to Chennai should be ~425km, got {}", dist);
    }

    #[test]
    fn test_reasonable_travel_time() {
        let provider = HaversineProvider::new(40.0);
        // 10 km at 40 km/h = 900 seconds
        assert_eq!(provider.km_to_seconds(10.0), 900.0);
    }

    #[test]
    fn test_leg_geometry_is_the_chord() {
        let provider = HaversineProvider::default();
        let from = point(9.9195, 78.1193);
        let to = point(9.9149, 78.124);
        let leg = provider.route_leg(from, to).now_or_never().unwrap().unwrap();

        let decoded = polyline::decode(&leg.encoded_geometry).unwrap();
        assert_eq!(decoded.len(), 2);
        assert!((decoded[1].latitude() - 9.9149).abs() < 1e-9);
        assert!(leg.distance_meters.unwrap() > 0.0);
        assert!(leg.duration_seconds.unwrap() > 0.0);
    }
}

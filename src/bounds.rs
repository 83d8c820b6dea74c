//! Viewport fitting for a finished route.

use serde::{Deserialize, Serialize};

use crate::geo::{Bounds, GeoCoordinate, MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsOptions {
    /// Fraction of each axis' span added on both sides.
    pub padding_fraction: f64,
    /// Smallest span, in degrees, either axis may have.
    pub min_span_degrees: f64,
}

impl Default for BoundsOptions {
    fn default() -> Self {
        Self {
            padding_fraction: 0.1,
            min_span_degrees: 0.01,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoundsCalculator {
    options: BoundsOptions,
}

impl BoundsCalculator {
    pub fn new(options: BoundsOptions) -> Self {
        Self { options }
    }

    /// Tight box around `points`, or `None` when there are none.
    pub fn covering<'a>(points: impl IntoIterator<Item = &'a GeoCoordinate>) -> Option<Bounds> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(Self::covering_from(first, points))
    }

    fn covering_from<'a>(
        first: &GeoCoordinate,
        rest: impl IntoIterator<Item = &'a GeoCoordinate>,
    ) -> Bounds {
        let start = Bounds {
            min_lat: first.latitude(),
            max_lat: first.latitude(),
            min_lon: first.longitude(),
            max_lon: first.longitude(),
        };
        rest.into_iter().fold(start, |b, point| Bounds {
            min_lat: b.min_lat.min(point.latitude()),
            max_lat: b.max_lat.max(point.latitude()),
            min_lon: b.min_lon.min(point.longitude()),
            max_lon: b.max_lon.max(point.longitude()),
        })
    }

    /// Padded viewport around `points`, never narrower than the minimum span.
    pub fn calculate<'a>(
        &self,
        points: impl IntoIterator<Item = &'a GeoCoordinate>,
    ) -> Option<Bounds> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(self.fit(first, points))
    }

    /// Same as [`BoundsCalculator::calculate`] for a point set known to be non-empty.
    pub fn fit<'a>(
        &self,
        first: &GeoCoordinate,
        rest: impl IntoIterator<Item = &'a GeoCoordinate>,
    ) -> Bounds {
        let tight = Self::covering_from(first, rest);
        let (min_lat, max_lat) =
            self.fit_axis(tight.min_lat, tight.max_lat, MIN_LATITUDE, MAX_LATITUDE);
        let (min_lon, max_lon) =
            self.fit_axis(tight.min_lon, tight.max_lon, MIN_LONGITUDE, MAX_LONGITUDE);
        Bounds {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    fn fit_axis(&self, min: f64, max: f64, limit_min: f64, limit_max: f64) -> (f64, f64) {
        let padding = (max - min) * self.options.padding_fraction.max(0.0);
        let mut low = min - padding;
        let mut high = max + padding;

        let min_span = self.options.min_span_degrees.min(limit_max - limit_min);
        if high - low < min_span {
            let center = (min + max) / 2.0;
            low = center - min_span / 2.0;
            high = center + min_span / 2.0;
        }

        // Slide rather than clip so the span survives near the poles and the antimeridian.
        if low < limit_min {
            high = (high + (limit_min - low)).min(limit_max);
            low = limit_min;
        }
        if high > limit_max {
            low = (low - (high - limit_max)).max(limit_min);
            high = limit_max;
        }
        (low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(raw: &[(f64, f64)]) -> Vec<GeoCoordinate> {
        raw.iter()
            .map(|&(lat, lng)| GeoCoordinate::new(lat, lng).unwrap())
            .collect()
    }

    #[test]
    fn test_empty_has_no_bounds() {
        assert_eq!(BoundsCalculator::default().calculate(&Vec::<GeoCoordinate>::new()), None);
    }

    #[test]
    fn test_covering_is_tight() {
        let pts = points(&[(10.0, 20.0), (10.02, 19.5), (9.9, 20.02)]);
        let b = BoundsCalculator::covering(&pts).unwrap();
        assert_eq!(
            b,
            Bounds {
                min_lat: 9.9,
                max_lat: 10.02,
                min_lon: 19.5,
                max_lon: 20.02
            }
        );
    }

    #[test]
    fn test_padding_each_side() {
        let pts = points(&[(10.0, 20.0), (11.0, 22.0)]);
        let b = BoundsCalculator::default().calculate(&pts).unwrap();
        assert!((b.min_lat - 9.9).abs() < 1e-9);
        assert!((b.max_lat - 11.1).abs() < 1e-9);
        assert!((b.min_lon - 19.8).abs() < 1e-9);
        assert!((b.max_lon - 22.2).abs() < 1e-9);
    }

    #[test]
    fn test_identical_points_get_minimum_span() {
        let pts = points(&[(10.0, 20.0), (10.0, 20.0), (10.0, 20.0)]);
        let options = BoundsOptions::default();
        let b = BoundsCalculator::new(options.clone()).calculate(&pts).unwrap();

        assert!(b.lat_span() >= options.min_span_degrees - 1e-12);
        assert!(b.lon_span() >= options.min_span_degrees - 1e-12);
        assert!(b.contains(&pts[0]));
        let (lat, lng) = b.center();
        assert!((lat - 10.0).abs() < 1e-9);
        assert!((lng - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_extent_on_one_axis() {
        let pts = points(&[(10.0, 20.0), (12.0, 20.0)]);
        let b = BoundsCalculator::default().calculate(&pts).unwrap();
        assert!(b.lat_span() > 2.0);
        assert!(b.lon_span() >= 0.01 - 1e-12);
    }

    #[test]
    fn test_stays_inside_valid_range() {
        let pts = points(&[(90.0, 180.0), (89.0, 179.0)]);
        let b = BoundsCalculator::default().calculate(&pts).unwrap();
        assert_eq!(b.max_lat, 90.0);
        assert_eq!(b.max_lon, 180.0);
        assert!((b.lat_span() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_includes_path_outside_waypoint_chord() {
        let waypoints = points(&[(10.0, 20.0), (10.0, 20.1)]);
        let path = points(&[(10.0, 20.0), (10.05, 20.05), (10.0, 20.1)]);
        let b = BoundsCalculator::default()
            .calculate(waypoints.iter().chain(path.iter()))
            .unwrap();
        assert!(b.max_lat > 10.05);
    }
}

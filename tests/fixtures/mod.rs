//! Test fixtures for trip-route.
//!
//! Provides realistic test data including:
//! - Real Madurai locations (from OpenStreetMap)
//! - Scripted leg providers with controllable failures and latency

#![allow(dead_code)]

pub mod madurai_locations;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use trip_route::error::LegFetchError;
use trip_route::geo::GeoCoordinate;
use trip_route::polyline;
use trip_route::traits::{LegRoute, LegRouteProvider};
use trip_route::waypoint::RawStop;

pub use madurai_locations::*;

pub fn stop(location: &Location) -> RawStop {
    RawStop::new(location.lat, location.lng)
        .with_name(location.name)
        .with_visit_duration(f64::from(location.visit_minutes))
}

/// What a scripted leg should do, keyed by the leg's start coordinate.
#[derive(Debug, Clone)]
pub struct LegScript {
    pub delay: Duration,
    pub outcome: Result<(), LegFetchError>,
}

/// Leg provider returning a 3-point geometry (start, midpoint, end) per leg.
///
/// Distance is 1000 m and duration 100 s for every successful leg. A leg
/// dropped while delayed is never recorded as completed.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: HashMap<String, LegScript>,
    pub completed: Mutex<Vec<String>>,
}

fn key(point: GeoCoordinate) -> String {
    format!("{:.5},{:.5}", point.latitude(), point.longitude())
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Legs starting at `(lat, lng)` sleep for `delay` before answering.
    pub fn delay_from(mut self, lat: f64, lng: f64, delay: Duration) -> Self {
        let point = GeoCoordinate::new(lat, lng).expect("valid fixture coordinate");
        self.scripts
            .entry(key(point))
            .or_insert(LegScript {
                delay: Duration::ZERO,
                outcome: Ok(()),
            })
            .delay = delay;
        self
    }

    /// Legs starting at `(lat, lng)` fail with `error`.
    pub fn fail_from(mut self, lat: f64, lng: f64, error: LegFetchError) -> Self {
        let point = GeoCoordinate::new(lat, lng).expect("valid fixture coordinate");
        self.scripts
            .entry(key(point))
            .or_insert(LegScript {
                delay: Duration::ZERO,
                outcome: Ok(()),
            })
            .outcome = Err(error);
        self
    }

    pub fn completion_order(&self) -> Vec<String> {
        self.completed.lock().expect("lock completed").clone()
    }
}

impl LegRouteProvider for ScriptedProvider {
    async fn route_leg(
        &self,
        from: GeoCoordinate,
        to: GeoCoordinate,
    ) -> Result<LegRoute, LegFetchError> {
        let script = self.scripts.get(&key(from)).cloned();
        if let Some(script) = &script {
            tokio::time::sleep(script.delay).await;
        }
        self.completed.lock().expect("lock completed").push(key(from));

        if let Some(LegScript { outcome: Err(err), .. }) = script {
            return Err(err);
        }

        let mid = GeoCoordinate::new(
            (from.latitude() + to.latitude()) / 2.0,
            (from.longitude() + to.longitude()) / 2.0,
        )
        .expect("midpoint in range");
        Ok(LegRoute {
            encoded_geometry: polyline::encode(&[from, mid, to]),
            distance_meters: Some(1000.0),
            duration_seconds: Some(100.0),
        })
    }
}

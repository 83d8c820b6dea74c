//! End-to-end trip route assembly.
//!
//! `sequence -> fetch (fan-out) -> assemble (fan-in) -> fit bounds`, producing
//! an immutable [`TripRoute`]. The fetch barrier is the only synchronization
//! point; a newer [`TripPlanner::plan`] call cancels the build it supersedes.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use crate::assembler::{RouteSegment, SegmentAssembler};
use crate::bounds::BoundsCalculator;
use crate::config::PlannerConfig;
use crate::error::{LegWarning, PlannerSetupError, TripRouteError};
use crate::fetcher::{CancellationToken, LegRouteFetcher};
use crate::geo::Bounds;
use crate::provider::HttpRoutingProvider;
use crate::traits::LegRouteProvider;
use crate::waypoint::{
    CoordinateValue, RawStop, Waypoint, WaypointRole, WaypointSequencer, lenient_coordinate,
    lenient_minutes, lenient_stops,
};

/// Payload handed over by the trip-planning service.
///
/// Field types are read leniently: a malformed stop or duration never
/// rejects the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripRequest {
    #[serde(deserialize_with = "lenient_coordinate")]
    pub user_latitude: Option<CoordinateValue>,
    #[serde(deserialize_with = "lenient_coordinate")]
    pub user_longitude: Option<CoordinateValue>,
    #[serde(deserialize_with = "lenient_stops")]
    pub stops: Vec<RawStop>,
    /// Time budget for the whole outing, in minutes.
    #[serde(deserialize_with = "lenient_minutes")]
    pub total_duration: Option<f64>,
}

impl TripRequest {
    pub fn new(
        user_latitude: impl Into<CoordinateValue>,
        user_longitude: impl Into<CoordinateValue>,
        stops: Vec<RawStop>,
    ) -> Self {
        Self {
            user_latitude: Some(user_latitude.into()),
            user_longitude: Some(user_longitude.into()),
            stops,
            total_duration: None,
        }
    }
}

/// A fully assembled route. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRoute {
    waypoints: Vec<Waypoint>,
    segments: Vec<RouteSegment>,
    total_distance_meters: Option<f64>,
    total_duration_seconds: Option<f64>,
    bounds: Bounds,
    palette: Vec<String>,
    time_limit_minutes: Option<f64>,
}

impl TripRoute {
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Ordered by leg index; failed legs are missing.
    pub fn segments(&self) -> &[RouteSegment] {
        &self.segments
    }

    pub fn leg_count(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }

    pub fn total_distance_meters(&self) -> Option<f64> {
        self.total_distance_meters
    }

    pub fn total_duration_seconds(&self) -> Option<f64> {
        self.total_duration_seconds
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn time_limit_minutes(&self) -> Option<f64> {
        self.time_limit_minutes
    }

    pub fn color_for(&self, segment: &RouteSegment) -> &str {
        &self.palette[segment.color_index % self.palette.len()]
    }

    /// Minutes spent at stops, from each stop's visit duration.
    pub fn total_visit_minutes(&self) -> f64 {
        self.waypoints
            .iter()
            .filter(|waypoint| waypoint.role == WaypointRole::Stop)
            .filter_map(|waypoint| waypoint.metadata.as_ref()?.visit_duration)
            .sum()
    }
}

/// A route plus the per-leg problems met while building it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedTrip {
    pub route: TripRoute,
    pub warnings: Vec<LegWarning>,
}

pub struct TripPlanner<P> {
    fetcher: LegRouteFetcher<P>,
    sequencer: WaypointSequencer,
    bounds: BoundsCalculator,
    palette: Vec<String>,
    current: Mutex<CancellationToken>,
}

impl TripPlanner<HttpRoutingProvider> {
    /// Planner backed by the HTTP routing provider described in `config.routing`.
    pub fn from_config(config: PlannerConfig) -> Result<Self, PlannerSetupError> {
        let provider = HttpRoutingProvider::new(config.routing.clone())?;
        Self::new(provider, config)
    }
}

impl<P> TripPlanner<P>
where
    P: LegRouteProvider + Sync,
{
    pub fn new(provider: P, config: PlannerConfig) -> Result<Self, PlannerSetupError> {
        config.validate()?;
        Ok(Self {
            fetcher: LegRouteFetcher::new(provider, &config.fetch)?,
            sequencer: WaypointSequencer::new(config.route_shape),
            bounds: BoundsCalculator::new(config.bounds),
            palette: config.palette,
            current: Mutex::new(CancellationToken::new()),
        })
    }

    pub fn provider(&self) -> &P {
        self.fetcher.provider()
    }

    /// Builds a route, cancelling whichever build this planner was running before.
    ///
    /// The superseded build's in-flight leg requests are dropped at once, so
    /// they hold no request slots while this build runs.
    pub fn plan(&self, request: &TripRequest) -> Result<PlannedTrip, TripRouteError> {
        let token = self.supersede();
        self.plan_with_token(request, &token)
    }

    /// Cancels the build started by the latest [`TripPlanner::plan`] call.
    pub fn cancel_current(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    /// Builds a route under a caller-owned token.
    pub fn plan_with_token(
        &self,
        request: &TripRequest,
        token: &CancellationToken,
    ) -> Result<PlannedTrip, TripRouteError> {
        let span = info_span!("trip_route", stops = request.stops.len());
        let _enter = span.enter();

        let waypoints = self.sequencer.sequence(
            request.user_latitude.as_ref(),
            request.user_longitude.as_ref(),
            &request.stops,
        )?;
        let legs = self.fetcher.fetch(&waypoints, token)?;

        let assembled = SegmentAssembler::new(
            self.palette.len(),
            self.fetcher.provider().polyline_precision(),
        )
        .assemble(&legs);

        let origin = &waypoints[0].coordinate;
        let path = assembled
            .segments
            .iter()
            .flat_map(|segment| segment.coordinates.iter());
        let bounds = self
            .bounds
            .fit(origin, waypoints[1..].iter().map(|w| &w.coordinate).chain(path));

        if token.is_cancelled() {
            warn!("trip route build cancelled after fetch");
            return Err(TripRouteError::Cancelled);
        }

        info!(
            waypoints = waypoints.len(),
            segments = assembled.segments.len(),
            failed_legs = assembled.warnings.len(),
            "trip route built"
        );

        Ok(PlannedTrip {
            route: TripRoute {
                waypoints,
                segments: assembled.segments,
                total_distance_meters: assembled.total_distance_meters,
                total_duration_seconds: assembled.total_duration_seconds,
                bounds,
                palette: self.palette.clone(),
                time_limit_minutes: request.total_duration,
            },
            warnings: assembled.warnings,
        })
    }

    fn supersede(&self) -> CancellationToken {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = CancellationToken::new();
        current.clone()
    }
}

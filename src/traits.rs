//! Seams between the route assembly engine and its collaborators.

use std::future::Future;

use crate::error::LegFetchError;
use crate::geo::GeoCoordinate;

/// Raw result of routing one leg, before its geometry is decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct LegRoute {
    pub encoded_geometry: String,
    pub distance_meters: Option<f64>,
    pub duration_seconds: Option<f64>,
}

/// Routes a single leg between two consecutive waypoints.
///
/// Several legs are in flight at once and must not assume anything about
/// the order in which they are requested. A returned future may be dropped
/// before it completes when its build is cancelled; dropping it must abort
/// the underlying request. Retries belong to a wrapper around the provider,
/// not inside it.
pub trait LegRouteProvider {
    fn route_leg(
        &self,
        from: GeoCoordinate,
        to: GeoCoordinate,
    ) -> impl Future<Output = Result<LegRoute, LegFetchError>> + Send;

    /// Precision of the geometries this provider returns.
    fn polyline_precision(&self) -> f64 {
        crate::polyline::PRECISION_5
    }
}

impl<P: LegRouteProvider + ?Sized> LegRouteProvider for &P {
    fn route_leg(
        &self,
        from: GeoCoordinate,
        to: GeoCoordinate,
    ) -> impl Future<Output = Result<LegRoute, LegFetchError>> + Send {
        (**self).route_leg(from, to)
    }

    fn polyline_precision(&self) -> f64 {
        (**self).polyline_precision()
    }
}

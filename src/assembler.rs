//! Stitches settled legs into ordered, colored segments.

use rayon::prelude::*;
use serde::Serialize;
use tracing::warn;

use crate::error::{LegFetchError, LegWarning};
use crate::fetcher::{LegStatus, RouteLeg};
use crate::geo::GeoCoordinate;
use crate::polyline::Polyline;

/// Decoded geometry of one fetched leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSegment {
    pub leg_index: usize,
    pub coordinates: Vec<GeoCoordinate>,
    /// Index into the display palette; a rendering hint only.
    pub color_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledSegments {
    /// Strictly increasing `leg_index`; failed legs leave gaps.
    pub segments: Vec<RouteSegment>,
    pub total_distance_meters: Option<f64>,
    pub total_duration_seconds: Option<f64>,
    pub warnings: Vec<LegWarning>,
}

#[derive(Debug, Clone)]
pub struct SegmentAssembler {
    palette_size: usize,
    precision: f64,
}

impl SegmentAssembler {
    /// `palette_size` of zero is treated as one.
    pub fn new(palette_size: usize, precision: f64) -> Self {
        Self {
            palette_size: palette_size.max(1),
            precision,
        }
    }

    pub fn assemble(&self, legs: &[RouteLeg]) -> AssembledSegments {
        let mut ordered: Vec<&RouteLeg> = legs.iter().collect();
        ordered.sort_by_key(|leg| leg.from_index);

        // Legs decode independently; `collect` keeps leg order.
        let decoded: Vec<Option<Result<Vec<GeoCoordinate>, LegFetchError>>> = ordered
            .par_iter()
            .map(|leg| (leg.status == LegStatus::Fetched).then(|| self.decode_leg(leg)))
            .collect();

        let mut out = AssembledSegments::default();
        for (leg, geometry) in ordered.into_iter().zip(decoded) {
            let leg_index = leg.from_index;
            match geometry {
                Some(Ok(coordinates)) => {
                    out.total_distance_meters =
                        add(out.total_distance_meters, leg.distance_meters);
                    out.total_duration_seconds =
                        add(out.total_duration_seconds, leg.duration_seconds);
                    out.segments.push(RouteSegment {
                        leg_index,
                        coordinates,
                        color_index: leg_index % self.palette_size,
                    });
                }
                Some(Err(error)) => {
                    warn!(leg = leg_index, error = %error, "dropping leg with bad geometry");
                    out.warnings.push(LegWarning { leg_index, error });
                }
                None => {
                    // Pending is unreachable after the fetch barrier; never rendered.
                    if let LegStatus::Failed(error) = &leg.status {
                        out.warnings.push(LegWarning {
                            leg_index,
                            error: error.clone(),
                        });
                    }
                }
            }
        }
        out
    }

    fn decode_leg(&self, leg: &RouteLeg) -> Result<Vec<GeoCoordinate>, LegFetchError> {
        let encoded = leg
            .encoded_geometry
            .as_deref()
            .ok_or(LegFetchError::NoGeometry)?;
        Ok(Polyline::decode(encoded, self.precision)?.into_points())
    }
}

fn add(total: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (total, value) {
        (Some(total), Some(value)) => Some(total + value),
        (None, value) => value,
        (total, None) => total,
    }
}

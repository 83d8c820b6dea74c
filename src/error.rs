//! Error taxonomy for trip route assembly.
//!
//! Only [`TripRouteError`] is ever returned from a build. Everything else
//! degrades the result instead: dropped stops shorten the waypoint list and
//! failed legs become [`LegWarning`]s next to a partial route.

use serde::Serialize;
use thiserror::Error;

use crate::geo::Axis;

/// The user's starting point could not be turned into a coordinate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidOriginError {
    #[error("origin {0} is missing")]
    Missing(Axis),
    #[error("origin {axis} {raw:?} is not a number")]
    Unparsable { axis: Axis, raw: String },
    #[error("origin {0} is outside the valid range")]
    OutOfRange(Axis),
}

/// A stop record that was excluded from the waypoint sequence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidWaypointError {
    #[error("stop {index} has no usable {axis}")]
    Unparsable { index: usize, axis: Axis },
    #[error("stop {index} {axis} is outside the valid range")]
    OutOfRange { index: usize, axis: Axis },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
pub enum MalformedPolylineError {
    #[error("polyline ends inside a chunk at byte {position}")]
    Truncated { position: usize },
    #[error("invalid polyline character {byte:#04x} at byte {position}")]
    InvalidCharacter { position: usize, byte: u8 },
    #[error("polyline chunk starting at byte {position} overflows 64 bits")]
    Overflow { position: usize },
    #[error("decoded point {index} is outside the valid coordinate range")]
    CoordinateOutOfRange { index: usize },
}

/// Why a single leg produced no geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
pub enum LegFetchError {
    #[error("routing provider answered with status {0}")]
    Status(u16),
    #[error("routing request timed out")]
    Timeout,
    #[error("routing request failed: {0}")]
    Transport(String),
    #[error("routing response is not valid JSON: {0}")]
    MalformedResponse(String),
    #[error("routing response has no geometry at {0}")]
    MissingGeometry(String),
    #[error("leg was marked fetched without an encoded geometry")]
    NoGeometry,
    #[error("could not build routing request URL: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Polyline(#[from] MalformedPolylineError),
}

impl From<reqwest::Error> for LegFetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LegFetchError::Timeout
        } else if let Some(status) = err.status() {
            LegFetchError::Status(status.as_u16())
        } else if err.is_decode() {
            LegFetchError::MalformedResponse(err.to_string())
        } else {
            LegFetchError::Transport(err.to_string())
        }
    }
}

/// A non-fatal per-leg failure reported alongside a (possibly partial) route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegWarning {
    pub leg_index: usize,
    pub error: LegFetchError,
}

/// Failures that prevent a [`crate::planner::TripRoute`] from being returned at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TripRouteError {
    #[error(transparent)]
    InvalidOrigin(#[from] InvalidOriginError),
    #[error("trip route build was cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid planner configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("palette must contain at least one color")]
    EmptyPalette,
    #[error("max_parallel_requests must be at least 1")]
    NoParallelism,
    #[error("polyline_precision must be a positive finite number, got {0}")]
    InvalidPrecision(f64),
    #[error("timeout_secs must be at least 1")]
    ZeroTimeout,
    #[error("min_span_degrees must be a positive finite number, got {0}")]
    InvalidMinSpan(f64),
    #[error("padding_fraction must be a finite number not below zero, got {0}")]
    InvalidPadding(f64),
}

/// Failures while constructing a planner.
#[derive(Debug, Error)]
pub enum PlannerSetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not build routing client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not start leg fetch runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

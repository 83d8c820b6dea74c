//! Planner configuration.
//!
//! Every section has working defaults; a JSON document only needs the
//! fields it wants to override.

use serde::{Deserialize, Serialize};

use crate::bounds::BoundsOptions;
use crate::error::ConfigError;
use crate::fetcher::FetchOptions;
use crate::provider::RoutingConfig;
use crate::waypoint::RouteShape;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub routing: RoutingConfig,
    pub fetch: FetchOptions,
    pub bounds: BoundsOptions,
    /// Cyclic display colors for segments.
    pub palette: Vec<String>,
    pub route_shape: RouteShape,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            routing: RoutingConfig::default(),
            fetch: FetchOptions::default(),
            bounds: BoundsOptions::default(),
            palette: ["#09c2f0", "#f0642b", "#4caf50", "#9c27b0", "#ffb300"]
                .iter()
                .map(|color| color.to_string())
                .collect(),
            route_shape: RouteShape::default(),
        }
    }
}

impl PlannerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        if self.fetch.max_parallel_requests == 0 {
            return Err(ConfigError::NoParallelism);
        }

        let precision = self.routing.polyline_precision;
        if !precision.is_finite() || precision <= 0.0 {
            return Err(ConfigError::InvalidPrecision(precision));
        }
        if self.routing.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let min_span = self.bounds.min_span_degrees;
        if !min_span.is_finite() || min_span <= 0.0 {
            return Err(ConfigError::InvalidMinSpan(min_span));
        }
        let padding = self.bounds.padding_fraction;
        if !padding.is_finite() || padding < 0.0 {
            return Err(ConfigError::InvalidPadding(padding));
        }
        Ok(())
    }
}

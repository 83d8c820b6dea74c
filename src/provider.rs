//! HTTP routing provider for per-leg route queries.
//!
//! Providers disagree on URL dialect (coordinate order, separators, where the
//! profile goes) and on where the geometry sits in the response, so all of
//! that lives in [`RoutingConfig`]. An OSRM-style server and a keyed
//! commercial API differ only in configuration.

use std::time::{Duration, Instant};

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::LegFetchError;
use crate::geo::GeoCoordinate;
use crate::polyline::PRECISION_5;
use crate::traits::{LegRoute, LegRouteProvider};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateOrder {
    #[default]
    LonLat,
    LatLon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub base_url: String,
    pub profile: String,
    /// Query parameter carrying the profile. `None` puts it in the path instead.
    pub profile_param: Option<String>,
    pub coordinate_order: CoordinateOrder,
    /// Between coordinate pairs, e.g. `;` for OSRM.
    pub pair_separator: String,
    /// Between the two numbers of one pair.
    pub coordinate_separator: String,
    /// Extra fixed query parameters.
    pub query: Vec<(String, String)>,
    pub api_key: Option<String>,
    pub api_key_param: String,
    /// JSON pointer to the encoded geometry string.
    pub geometry_json_path: String,
    pub distance_json_path: Option<String>,
    pub duration_json_path: Option<String>,
    pub polyline_precision: f64,
    pub timeout_secs: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self::osrm("http://localhost:5000")
    }
}

impl RoutingConfig {
    /// Self-hosted OSRM `route` service.
    pub fn osrm(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: format!("{}/route/v1", base_url.trim_end_matches('/')),
            profile: "driving".to_string(),
            profile_param: None,
            coordinate_order: CoordinateOrder::LonLat,
            pair_separator: ";".to_string(),
            coordinate_separator: ",".to_string(),
            query: vec![("overview".to_string(), "full".to_string())],
            api_key: None,
            api_key_param: "key".to_string(),
            geometry_json_path: "/routes/0/geometry".to_string(),
            distance_json_path: Some("/routes/0/distance".to_string()),
            duration_json_path: Some("/routes/0/duration".to_string()),
            polyline_precision: PRECISION_5,
            timeout_secs: 10,
        }
    }

    /// Full request URL for one leg. Query values are percent-encoded.
    pub fn request_url(
        &self,
        from: GeoCoordinate,
        to: GeoCoordinate,
    ) -> Result<Url, LegFetchError> {
        let pairs = [from, to]
            .iter()
            .map(|point| self.format_pair(point))
            .collect::<Vec<_>>()
            .join(&self.pair_separator);

        let base = self.base_url.trim_end_matches('/');
        let mut params: Vec<(&str, &str)> = Vec::new();
        let path = match &self.profile_param {
            Some(name) => {
                params.push((name.as_str(), self.profile.as_str()));
                format!("{}/{}", base, pairs)
            }
            None => format!("{}/{}/{}", base, self.profile, pairs),
        };

        params.extend(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(key) = &self.api_key {
            params.push((self.api_key_param.as_str(), key.as_str()));
        }

        let mut url =
            Url::parse(&path).map_err(|err| LegFetchError::InvalidUrl(err.to_string()))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    fn format_pair(&self, point: &GeoCoordinate) -> String {
        let (first, second) = match self.coordinate_order {
            CoordinateOrder::LonLat => (point.longitude(), point.latitude()),
            CoordinateOrder::LatLon => (point.latitude(), point.longitude()),
        };
        format!("{:.6}{}{:.6}", first, self.coordinate_separator, second)
    }

    /// Pulls geometry, distance and duration out of a provider response.
    pub fn parse_response(&self, body: &Value) -> Result<LegRoute, LegFetchError> {
        let encoded_geometry = body
            .pointer(&self.geometry_json_path)
            .and_then(Value::as_str)
            .ok_or_else(|| LegFetchError::MissingGeometry(self.geometry_json_path.clone()))?
            .to_string();

        let number_at = |path: &Option<String>| {
            path.as_deref()
                .and_then(|path| body.pointer(path))
                .and_then(Value::as_f64)
                .filter(|value| value.is_finite())
        };

        Ok(LegRoute {
            encoded_geometry,
            distance_meters: number_at(&self.distance_json_path),
            duration_seconds: number_at(&self.duration_json_path),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpRoutingProvider {
    config: RoutingConfig,
    client: reqwest::Client,
}

impl HttpRoutingProvider {
    pub fn new(config: RoutingConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }
}

impl LegRouteProvider for HttpRoutingProvider {
    async fn route_leg(
        &self,
        from: GeoCoordinate,
        to: GeoCoordinate,
    ) -> Result<LegRoute, LegFetchError> {
        let url = self.config.request_url(from, to)?;
        let started = Instant::now();

        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|err| LegFetchError::MalformedResponse(err.to_string()))?;

        debug!(path = url.path(), elapsed = ?started.elapsed(), "leg route response");
        self.config.parse_response(&body)
    }

    fn polyline_precision(&self) -> f64 {
        self.config.polyline_precision
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn point(lat: f64, lng: f64) -> GeoCoordinate {
        GeoCoordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_osrm_url() {
        let config = RoutingConfig::osrm("http://10.0.0.5:5000/");
        let url = config
            .request_url(point(9.9195, 78.1193), point(9.9149, 78.124))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://10.0.0.5:5000/route/v1/driving/78.119300,9.919500;78.124000,9.914900\
             ?overview=full"
        );
    }

    #[test]
    fn test_query_profile_lat_lon_with_key() {
        let config = RoutingConfig {
            base_url: "https://maps.example.com/directions".to_string(),
            profile: "walking".to_string(),
            profile_param: Some("mode".to_string()),
            coordinate_order: CoordinateOrder::LatLon,
            pair_separator: "|".to_string(),
            query: Vec::new(),
            api_key: Some("secret".to_string()),
            ..RoutingConfig::default()
        };
        let url = config.request_url(point(1.0, 2.0), point(3.0, 4.0)).unwrap();
        assert_eq!(url.path(), "/directions/1.000000,2.000000|3.000000,4.000000");
        assert_eq!(url.query(), Some("mode=walking&key=secret"));
    }

    #[test]
    fn test_query_values_are_encoded() {
        let config = RoutingConfig {
            api_key: Some("a&b=c #d".to_string()),
            ..RoutingConfig::osrm("http://10.0.0.5:5000")
        };
        let url = config.request_url(point(1.0, 2.0), point(3.0, 4.0)).unwrap();
        assert_eq!(url.query(), Some("overview=full&key=a%26b%3Dc+%23d"));

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[1], ("key".to_string(), "a&b=c #d".to_string()));
    }

    #[test]
    fn test_unparsable_base_url_fails_leg() {
        let config = RoutingConfig {
            base_url: "not a url".to_string(),
            ..RoutingConfig::default()
        };
        let err = config.request_url(point(1.0, 2.0), point(3.0, 4.0)).unwrap_err();
        assert!(matches!(err, LegFetchError::InvalidUrl(_)));
    }

    #[test]
    fn test_parse_osrm_response() {
        let config = RoutingConfig::default();
        let body = json!({
            "code": "Ok",
            "routes": [{ "geometry": "_p~iF~ps|U_ulLnnqC", "distance": 1520.4, "duration": 210.0 }]
        });
        let leg = config.parse_response(&body).unwrap();
        assert_eq!(leg.encoded_geometry, "_p~iF~ps|U_ulLnnqC");
        assert_eq!(leg.distance_meters, Some(1520.4));
        assert_eq!(leg.duration_seconds, Some(210.0));
    }

    #[test]
    fn test_parse_without_metrics() {
        let config = RoutingConfig {
            distance_json_path: None,
            ..RoutingConfig::default()
        };
        let body = json!({ "routes": [{ "geometry": "??", "duration": "slow" }] });
        let leg = config.parse_response(&body).unwrap();
        assert_eq!(leg.distance_meters, None);
        assert_eq!(leg.duration_seconds, None);
    }

    #[test]
    fn test_parse_missing_geometry() {
        let config = RoutingConfig::default();
        let body = json!({ "code": "NoRoute", "routes": [] });
        assert_eq!(
            config.parse_response(&body),
            Err(LegFetchError::MissingGeometry("/routes/0/geometry".to_string()))
        );
    }

    #[test]
    fn test_config_deserializes_partially() {
        let raw = r#"{ "profile": "foot", "coordinate_order": "lat_lon" }"#;
        let config: RoutingConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.profile, "foot");
        assert_eq!(config.coordinate_order, CoordinateOrder::LatLon);
        assert_eq!(config.pair_separator, ";");
    }
}

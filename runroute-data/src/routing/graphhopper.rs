//! `RoutingProvider` backed by the GraphHopper routing API.
//!
//! Loops use GraphHopper's `round_trip` algorithm; paths pass each waypoint
//! as a repeated `point=lat,lon` parameter. Geometry is requested unencoded
//! with elevation.
//!
//! See: <https://docs.graphhopper.com/#tag/Routing-API>

use std::fmt;
use std::time::Duration;

use runroute_core::{ProviderError, RouteQuery, RouteResult, RoutingProvider};
use serde::Deserialize;
use url::Url;

use super::positions_to_points;
use crate::http::{
    DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, HttpBridge, ProviderBuildError, Reply, endpoint,
    parse_base_url, require_key,
};

/// Public GraphHopper endpoint.
pub const DEFAULT_GRAPHHOPPER_BASE_URL: &str = "https://graphhopper.com/api/1";

/// Vehicle profile used for running routes.
pub const DEFAULT_GRAPHHOPPER_PROFILE: &str = "foot";

const PROVIDER_NAME: &str = "graphhopper";

/// Configuration for [`GraphHopperRoutingProvider`].
#[derive(Clone)]
pub struct GraphHopperConfig {
    /// API key sent as the `key` query parameter.
    pub api_key: String,
    /// Service root, e.g. `"https://graphhopper.com/api/1"`.
    pub base_url: String,
    /// Routing profile.
    pub profile: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl fmt::Debug for GraphHopperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphHopperConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("profile", &self.profile)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl GraphHopperConfig {
    /// Configuration for the public service with the given key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GRAPHHOPPER_BASE_URL.to_owned(),
            profile: DEFAULT_GRAPHHOPPER_PROFILE.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Point at a self-hosted instance.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the routing profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    paths: Vec<Path>,
}

#[derive(Debug, Deserialize)]
struct Path {
    #[serde(default)]
    distance: f64,
    ascend: Option<f64>,
    points: PointList,
}

#[derive(Debug, Deserialize)]
struct PointList {
    coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: String,
    #[serde(default)]
    hints: Vec<Hint>,
}

#[derive(Debug, Deserialize)]
struct Hint {
    #[serde(default)]
    details: String,
}

/// Exceptions GraphHopper raises when the points cannot be routed.
const UNROUTABLE_EXCEPTIONS: [&str; 2] = ["PointNotFoundException", "ConnectionNotFoundException"];

/// GraphHopper routing client.
#[derive(Debug)]
pub struct GraphHopperRoutingProvider {
    bridge: HttpBridge,
    config: GraphHopperConfig,
    route_url: Url,
}

impl GraphHopperRoutingProvider {
    /// Create a provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank, the base URL does not parse, or
    /// the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: GraphHopperConfig) -> Result<Self, ProviderBuildError> {
        require_key(&config.api_key, PROVIDER_NAME)?;
        let route_url = endpoint(&parse_base_url(&config.base_url)?, "route");
        let bridge = HttpBridge::new(&config.user_agent, config.timeout)?;
        Ok(Self {
            bridge,
            config,
            route_url,
        })
    }

    fn build_url(&self, query: &RouteQuery) -> Url {
        let mut url = self.route_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("key", &self.config.api_key)
                .append_pair("profile", &self.config.profile)
                .append_pair("elevation", "true")
                .append_pair("points_encoded", "false")
                .append_pair("instructions", "false");
            match query {
                RouteQuery::RoundTrip {
                    start,
                    length_m,
                    seed,
                } => {
                    pairs
                        .append_pair("point", &format!("{},{}", start.lat, start.lon))
                        .append_pair("algorithm", "round_trip")
                        .append_pair("round_trip.distance", &format!("{length_m:.0}"))
                        .append_pair("round_trip.seed", &seed.to_string());
                }
                RouteQuery::Path { waypoints } => {
                    for point in waypoints {
                        pairs.append_pair("point", &format!("{},{}", point.lat, point.lon));
                    }
                }
            }
        }
        url
    }

    fn convert_response(raw: serde_json::Value) -> Result<RouteResult, ProviderError> {
        let response: RouteResponse =
            serde_json::from_value(raw.clone()).map_err(|err| ProviderError::ParseError {
                message: err.to_string(),
            })?;
        let path = response
            .paths
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NoRoute {
                message: "response contained no paths".to_owned(),
            })?;
        let points = positions_to_points(&path.points.coordinates)?;
        Ok(RouteResult::new(points, path.distance, path.ascend, PROVIDER_NAME).with_raw(raw))
    }
}

fn classify_error(reply: &Reply) -> ProviderError {
    if let Err(err) = reply.check_credentials() {
        return err;
    }
    let Ok(error) = reply.json::<ErrorResponse>() else {
        return reply.http_error();
    };
    let unroutable = error.hints.iter().any(|hint| {
        UNROUTABLE_EXCEPTIONS
            .iter()
            .any(|exception| hint.details.ends_with(*exception))
    });
    if unroutable {
        ProviderError::NoRoute {
            message: error.message,
        }
    } else {
        ProviderError::HttpError {
            url: reply.url.clone(),
            status: reply.status.as_u16(),
            message: error.message,
        }
    }
}

impl RoutingProvider for GraphHopperRoutingProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn route(&self, query: &RouteQuery) -> Result<RouteResult, ProviderError> {
        let url = self.build_url(query);
        let reply = self.bridge.execute(self.bridge.client().get(url.clone()), &url)?;
        if !reply.status.is_success() {
            return Err(classify_error(&reply));
        }
        Self::convert_response(reply.json()?)
    }
}

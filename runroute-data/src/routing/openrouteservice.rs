//! `RoutingProvider` backed by the OpenRouteService directions API.
//!
//! # Example
//!
//! ```no_run
//! use runroute_core::{RoutePoint, RouteQuery, RoutingProvider};
//! use runroute_data::routing::{OrsConfig, OrsRoutingProvider};
//!
//! let provider = OrsRoutingProvider::with_config(OrsConfig::new("my-api-key"))?;
//! let start = RoutePoint::new(59.3293, 18.0686)?;
//! let route = provider.route(&RouteQuery::RoundTrip { start, length_m: 5_000.0, seed: 1 })?;
//! println!("{} m", route.distance_m);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use runroute_core::{ProviderError, RouteQuery, RouteResult, RoutingProvider};
use url::Url;

use super::ors::{
    CODE_LIMIT_EXCEEDED, CODE_POINT_NOT_FOUND, CODE_ROUTE_NOT_FOUND, DirectionsOptions,
    DirectionsRequest, DirectionsResponse, ErrorDetail, ErrorResponse, RoundTripOptions,
};
use super::positions_to_points;
use crate::http::{
    DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, HttpBridge, ProviderBuildError, Reply, endpoint,
    parse_base_url, require_key,
};

/// Public OpenRouteService endpoint.
pub const DEFAULT_ORS_BASE_URL: &str = "https://api.openrouteservice.org";

/// Routing profile used for running routes.
pub const DEFAULT_ORS_PROFILE: &str = "foot-walking";

/// Name recorded on routes from this provider.
const PROVIDER_NAME: &str = "openrouteservice";

/// Configuration shared by the OpenRouteService routing and geocoding
/// adapters.
#[derive(Clone)]
pub struct OrsConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// Service root, e.g. `"https://api.openrouteservice.org"`.
    pub base_url: String,
    /// Directions profile, e.g. `"foot-walking"` or `"foot-hiking"`.
    pub profile: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl fmt::Debug for OrsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrsConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("profile", &self.profile)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl OrsConfig {
    /// Configuration for the public service with the given key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_ORS_BASE_URL.to_owned(),
            profile: DEFAULT_ORS_PROFILE.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Point at a self-hosted or proxied instance.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the directions profile.
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

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// OpenRouteService directions client.
///
/// Loops use the service's `round_trip` option; paths pass every waypoint as
/// a coordinate. Geometry always includes elevation.
#[derive(Debug)]
pub struct OrsRoutingProvider {
    bridge: HttpBridge,
    config: OrsConfig,
    directions_url: Url,
}

impl OrsRoutingProvider {
    /// Create a provider for the public service.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(OrsConfig::new(api_key))
    }

    /// Create a provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank, the base URL does not parse, or
    /// the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: OrsConfig) -> Result<Self, ProviderBuildError> {
        require_key(&config.api_key, PROVIDER_NAME)?;
        let base = parse_base_url(&config.base_url)?;
        let directions_url = endpoint(
            &base,
            &format!("v2/directions/{}/geojson", config.profile),
        );
        let bridge = HttpBridge::new(&config.user_agent, config.timeout)?;
        Ok(Self {
            bridge,
            config,
            directions_url,
        })
    }

    fn build_request(query: &RouteQuery) -> DirectionsRequest {
        let (coordinates, options) = match query {
            RouteQuery::RoundTrip {
                start,
                length_m,
                seed,
            } => (
                vec![[start.lon, start.lat]],
                Some(DirectionsOptions {
                    round_trip: RoundTripOptions::for_length(*length_m, *seed),
                }),
            ),
            RouteQuery::Path { waypoints } => (
                waypoints.iter().map(|point| [point.lon, point.lat]).collect(),
                None,
            ),
        };
        DirectionsRequest {
            coordinates,
            elevation: true,
            instructions: false,
            options,
        }
    }

    fn convert_response(raw: serde_json::Value) -> Result<RouteResult, ProviderError> {
        let response: DirectionsResponse =
            serde_json::from_value(raw.clone()).map_err(|err| ProviderError::ParseError {
                message: err.to_string(),
            })?;
        let feature = response
            .features
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NoRoute {
                message: "response contained no route features".to_owned(),
            })?;
        let points = positions_to_points(&feature.geometry.coordinates)?;
        Ok(RouteResult::new(
            points,
            feature.properties.summary.distance,
            feature.properties.ascent,
            PROVIDER_NAME,
        )
        .with_raw(raw))
    }
}

/// Interpret a non-success directions reply.
pub(crate) fn classify_error(reply: &Reply) -> ProviderError {
    if let Err(err) = reply.check_credentials() {
        return err;
    }
    match reply.json::<ErrorResponse>() {
        Ok(ErrorResponse {
            error: ErrorDetail::Coded { code, message },
        }) => match code {
            CODE_POINT_NOT_FOUND | CODE_ROUTE_NOT_FOUND => ProviderError::NoRoute { message },
            CODE_LIMIT_EXCEEDED => ProviderError::LimitExceeded { message },
            _ => ProviderError::ServiceError {
                code: code.to_string(),
                message,
            },
        },
        Ok(ErrorResponse {
            error: ErrorDetail::Message(message),
        }) => ProviderError::HttpError {
            url: reply.url.clone(),
            status: reply.status.as_u16(),
            message,
        },
        Err(_) => reply.http_error(),
    }
}

impl RoutingProvider for OrsRoutingProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn route(&self, query: &RouteQuery) -> Result<RouteResult, ProviderError> {
        let body = Self::build_request(query);
        let request = self
            .bridge
            .client()
            .post(self.directions_url.clone())
            .header(AUTHORIZATION, &self.config.api_key)
            .json(&body);
        let reply = self.bridge.execute(request, &self.directions_url)?;
        if !reply.status.is_success() {
            return Err(classify_error(&reply));
        }
        Self::convert_response(reply.json()?)
    }
}

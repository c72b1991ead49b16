//! `Geocoder` backed by a Nominatim instance.
//!
//! The public OpenStreetMap instance requires an identifying user agent and
//! allows at most one request per second, so every call waits out
//! [`NominatimConfig::min_interval`] since the previous one.
//!
//! See: <https://nominatim.org/release-docs/latest/api/Overview/>

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use runroute_core::{GeocodeError, Geocoder, Place, ProviderError, RoutePoint};
use serde::Deserialize;
use url::Url;

use crate::http::{
    DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, HttpBridge, ProviderBuildError, Reply, endpoint,
    parse_base_url,
};

/// Public OpenStreetMap Nominatim endpoint.
pub const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Minimum spacing between requests under the public usage policy.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for [`NominatimGeocoder`].
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Service root.
    pub base_url: String,
    /// User agent identifying the application.
    pub user_agent: String,
    /// Minimum time between consecutive requests.
    pub min_interval: Duration,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOMINATIM_BASE_URL.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            min_interval: DEFAULT_MIN_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl NominatimConfig {
    /// Point at another instance.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the minimum spacing between requests.
    #[must_use]
    pub const fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One search hit or reverse result. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

impl NominatimPlace {
    fn into_place(self) -> Result<Place, GeocodeError> {
        let parse = |value: &str| {
            value.trim().parse::<f64>().map_err(|err| ProviderError::ParseError {
                message: format!("coordinate {value:?}: {err}"),
            })
        };
        let point = RoutePoint::new(parse(&self.lat)?, parse(&self.lon)?)?;
        let label = if self.display_name.is_empty() {
            point.to_string()
        } else {
            self.display_name
        };
        Ok(Place { point, label })
    }
}

/// Reverse lookups answer `{"error": "Unable to geocode"}` with status 200
/// when nothing is near.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReverseResponse {
    Found(NominatimPlace),
    Missing {
        #[serde(default)]
        error: String,
    },
}

/// Rate-limited Nominatim client.
#[derive(Debug)]
pub struct NominatimGeocoder {
    bridge: HttpBridge,
    config: NominatimConfig,
    search_url: Url,
    reverse_url: Url,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimGeocoder {
    /// Create a geocoder for the public instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new() -> Result<Self, ProviderBuildError> {
        Self::with_config(NominatimConfig::default())
    }

    /// Create a geocoder with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client or
    /// Tokio runtime fails to build.
    pub fn with_config(config: NominatimConfig) -> Result<Self, ProviderBuildError> {
        let base = parse_base_url(&config.base_url)?;
        Ok(Self {
            bridge: HttpBridge::new(&config.user_agent, config.timeout)?,
            search_url: endpoint(&base, "search"),
            reverse_url: endpoint(&base, "reverse"),
            config,
            last_request: Mutex::new(None),
        })
    }

    fn search_url(&self, query: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json")
            .append_pair("limit", "1");
        url
    }

    fn reverse_url(&self, point: RoutePoint) -> Url {
        let mut url = self.reverse_url.clone();
        url.query_pairs_mut()
            .append_pair("lat", &point.lat.to_string())
            .append_pair("lon", &point.lon.to_string())
            .append_pair("format", "json");
        url
    }

    /// Sleep until `min_interval` has passed since the previous request.
    fn throttle(&self) {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = *last {
            let wait = self.config.min_interval.saturating_sub(previous.elapsed());
            if !wait.is_zero() {
                log::debug!("waiting {wait:?} before the next Nominatim request");
                std::thread::sleep(wait);
            }
        }
        *last = Some(Instant::now());
    }

    fn get(&self, url: &Url) -> Result<Reply, ProviderError> {
        self.throttle();
        let reply = self.bridge.execute(self.bridge.client().get(url.clone()), url)?;
        reply.check_credentials()?;
        if !reply.status.is_success() {
            return Err(reply.http_error());
        }
        Ok(reply)
    }
}

fn first_hit(reply: &Reply) -> Result<Option<NominatimPlace>, ProviderError> {
    let hits: Vec<NominatimPlace> = reply.json()?;
    Ok(hits.into_iter().next())
}

fn reverse_hit(reply: &Reply) -> Result<Option<NominatimPlace>, ProviderError> {
    match reply.json()? {
        ReverseResponse::Found(place) => Ok(Some(place)),
        ReverseResponse::Missing { error } => {
            log::debug!("reverse lookup found nothing: {error}");
            Ok(None)
        }
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, query: &str) -> Result<Place, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }
        let reply = self.get(&self.search_url(query))?;
        first_hit(&reply)?
            .ok_or_else(|| GeocodeError::NotFound {
                query: query.to_owned(),
            })?
            .into_place()
    }

    fn reverse(&self, point: RoutePoint) -> Result<Place, GeocodeError> {
        let reply = self.get(&self.reverse_url(point))?;
        reverse_hit(&reply)?
            .ok_or_else(|| GeocodeError::NotFound {
                query: point.to_string(),
            })
            .and_then(NominatimPlace::into_place)
    }
}

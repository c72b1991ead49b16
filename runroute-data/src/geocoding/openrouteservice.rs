//! `Geocoder` backed by the OpenRouteService (Pelias) geocoding API.
//!
//! See: <https://openrouteservice.org/dev/#/api-docs/geocode>

use runroute_core::{GeocodeError, Geocoder, Place, ProviderError, RoutePoint};
use serde::Deserialize;
use url::Url;

use crate::http::{HttpBridge, ProviderBuildError, Reply, endpoint, parse_base_url, require_key};
use crate::routing::OrsConfig;

const SERVICE_NAME: &str = "openrouteservice geocoding";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: PointGeometry,
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct PointGeometry {
    /// `[lon, lat]`.
    coordinates: [f64; 2],
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    label: Option<String>,
    name: Option<String>,
}

impl Feature {
    fn into_place(self) -> Result<Place, GeocodeError> {
        let [lon, lat] = self.geometry.coordinates;
        let point = RoutePoint::new(lat, lon)?;
        let label = self
            .properties
            .label
            .or(self.properties.name)
            .unwrap_or_else(|| point.to_string());
        Ok(Place { point, label })
    }
}

/// OpenRouteService geocoding client.
///
/// Shares [`OrsConfig`] with the routing provider; the profile is ignored.
#[derive(Debug)]
pub struct OrsGeocoder {
    bridge: HttpBridge,
    api_key: String,
    search_url: Url,
    reverse_url: Url,
}

impl OrsGeocoder {
    /// Create a geocoder from shared OpenRouteService configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank, the base URL does not parse, or
    /// the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: &OrsConfig) -> Result<Self, ProviderBuildError> {
        require_key(&config.api_key, SERVICE_NAME)?;
        let base = parse_base_url(&config.base_url)?;
        Ok(Self {
            bridge: HttpBridge::new(&config.user_agent, config.timeout)?,
            api_key: config.api_key.clone(),
            search_url: endpoint(&base, "geocode/search"),
            reverse_url: endpoint(&base, "geocode/reverse"),
        })
    }

    fn search_url(&self, query: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("api_key", &self.api_key)
            .append_pair("text", query)
            .append_pair("size", "1");
        url
    }

    fn reverse_url(&self, point: RoutePoint) -> Url {
        let mut url = self.reverse_url.clone();
        url.query_pairs_mut()
            .append_pair("api_key", &self.api_key)
            .append_pair("point.lon", &point.lon.to_string())
            .append_pair("point.lat", &point.lat.to_string())
            .append_pair("size", "1");
        url
    }

    fn fetch(&self, url: &Url) -> Result<Option<Feature>, GeocodeError> {
        let reply = self.bridge.execute(self.bridge.client().get(url.clone()), url)?;
        Ok(first_feature(&reply)?)
    }
}

fn first_feature(reply: &Reply) -> Result<Option<Feature>, ProviderError> {
    reply.check_credentials()?;
    if !reply.status.is_success() {
        return Err(reply.http_error());
    }
    let collection: FeatureCollection = reply.json()?;
    Ok(collection.features.into_iter().next())
}

impl Geocoder for OrsGeocoder {
    fn geocode(&self, query: &str) -> Result<Place, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }
        self.fetch(&self.search_url(query))?
            .ok_or_else(|| GeocodeError::NotFound {
                query: query.to_owned(),
            })?
            .into_place()
    }

    fn reverse(&self, point: RoutePoint) -> Result<Place, GeocodeError> {
        self.fetch(&self.reverse_url(point))?
            .ok_or_else(|| GeocodeError::NotFound {
                query: point.to_string(),
            })
            .and_then(Feature::into_place)
    }
}

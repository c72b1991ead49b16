//! Construction of the HTTP geocoders and routing providers from resolved
//! command configuration.

use std::time::Duration;

use clap::ValueEnum;
use runroute_core::{Geocoder, RoutingProvider};
use runroute_data::geocoding::{NominatimConfig, NominatimGeocoder, OrsGeocoder};
use runroute_data::routing::{
    DEFAULT_GRAPHHOPPER_BASE_URL, DEFAULT_ORS_BASE_URL, GraphHopperConfig,
    GraphHopperRoutingProvider, OrsConfig, OrsRoutingProvider,
};
use serde::{Deserialize, Serialize};

use crate::{ARG_GRAPHHOPPER_API_KEY, ARG_ORS_API_KEY, CliError};

/// Geocoding service for addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum GeocoderChoice {
    /// OpenStreetMap Nominatim; no key needed.
    #[default]
    Nominatim,
    /// OpenRouteService geocoding; uses the ORS key.
    Openrouteservice,
}

/// Which routing services to consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum ProviderChoice {
    /// GraphHopper when its key is configured, otherwise OpenRouteService.
    #[default]
    Auto,
    /// OpenRouteService only.
    Openrouteservice,
    /// GraphHopper only.
    Graphhopper,
    /// Both, keeping the closer match.
    All,
}

/// Unresolved service options as merged from flags, files and environment.
#[derive(Debug, Clone, Default)]
pub(crate) struct ServiceOptions {
    pub(crate) ors_api_key: Option<String>,
    pub(crate) ors_base_url: Option<String>,
    pub(crate) graphhopper_api_key: Option<String>,
    pub(crate) graphhopper_base_url: Option<String>,
    pub(crate) nominatim_base_url: Option<String>,
    pub(crate) timeout_secs: Option<u64>,
}

/// Credentials and endpoints for the HTTP adapters.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct ServiceConfig {
    pub(crate) ors_api_key: Option<String>,
    pub(crate) ors_base_url: String,
    pub(crate) graphhopper_api_key: Option<String>,
    pub(crate) graphhopper_base_url: String,
    pub(crate) nominatim_base_url: Option<String>,
    pub(crate) timeout: Duration,
    /// Environment variables reported when a key is missing.
    pub(crate) key_envs: KeyEnvs,
}

/// Environment variable names for the API keys of one subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyEnvs {
    pub(crate) ors: &'static str,
    pub(crate) graphhopper: &'static str,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("ServiceConfig")
            .field("ors_api_key", &redact(&self.ors_api_key))
            .field("ors_base_url", &self.ors_base_url)
            .field("graphhopper_api_key", &redact(&self.graphhopper_api_key))
            .field("graphhopper_base_url", &self.graphhopper_base_url)
            .field("nominatim_base_url", &self.nominatim_base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

impl ServiceConfig {
    pub(crate) fn resolve(options: ServiceOptions, key_envs: KeyEnvs) -> Self {
        Self {
            ors_api_key: non_blank(options.ors_api_key),
            ors_base_url: non_blank(options.ors_base_url)
                .unwrap_or_else(|| DEFAULT_ORS_BASE_URL.to_owned()),
            graphhopper_api_key: non_blank(options.graphhopper_api_key),
            graphhopper_base_url: non_blank(options.graphhopper_base_url)
                .unwrap_or_else(|| DEFAULT_GRAPHHOPPER_BASE_URL.to_owned()),
            nominatim_base_url: non_blank(options.nominatim_base_url),
            timeout: options
                .timeout_secs
                .map_or(runroute_data::DEFAULT_TIMEOUT, Duration::from_secs),
            key_envs,
        }
    }

    pub(crate) fn ors_config(&self) -> Result<OrsConfig, CliError> {
        let key = self.ors_api_key.clone().ok_or(CliError::MissingArgument {
            field: ARG_ORS_API_KEY,
            env: self.key_envs.ors,
        })?;
        Ok(OrsConfig::new(key)
            .with_base_url(self.ors_base_url.clone())
            .with_timeout(self.timeout))
    }

    pub(crate) fn graphhopper_config(&self) -> Result<GraphHopperConfig, CliError> {
        let key = self
            .graphhopper_api_key
            .clone()
            .ok_or(CliError::MissingArgument {
                field: ARG_GRAPHHOPPER_API_KEY,
                env: self.key_envs.graphhopper,
            })?;
        Ok(GraphHopperConfig::new(key)
            .with_base_url(self.graphhopper_base_url.clone())
            .with_timeout(self.timeout))
    }

    pub(crate) fn nominatim_config(&self) -> NominatimConfig {
        let config = NominatimConfig::default().with_timeout(self.timeout);
        match &self.nominatim_base_url {
            Some(base_url) => config.with_base_url(base_url.clone()),
            None => config,
        }
    }
}

/// Build the geocoder selected by `choice`.
pub(crate) fn build_geocoder(
    choice: GeocoderChoice,
    services: &ServiceConfig,
) -> Result<Box<dyn Geocoder>, CliError> {
    match choice {
        GeocoderChoice::Nominatim => {
            let geocoder = NominatimGeocoder::with_config(services.nominatim_config())
                .map_err(|source| CliError::BuildAdapter {
                    service: "Nominatim",
                    source,
                })?;
            Ok(Box::new(geocoder))
        }
        GeocoderChoice::Openrouteservice => {
            let geocoder = OrsGeocoder::with_config(&services.ors_config()?).map_err(|source| {
                CliError::BuildAdapter {
                    service: "OpenRouteService geocoding",
                    source,
                }
            })?;
            Ok(Box::new(geocoder))
        }
    }
}

fn ors_provider(services: &ServiceConfig) -> Result<Box<dyn RoutingProvider>, CliError> {
    let provider = OrsRoutingProvider::with_config(services.ors_config()?).map_err(|source| {
        CliError::BuildAdapter {
            service: "OpenRouteService",
            source,
        }
    })?;
    Ok(Box::new(provider))
}

fn graphhopper_provider(services: &ServiceConfig) -> Result<Box<dyn RoutingProvider>, CliError> {
    let provider =
        GraphHopperRoutingProvider::with_config(services.graphhopper_config()?).map_err(
            |source| CliError::BuildAdapter {
                service: "GraphHopper",
                source,
            },
        )?;
    Ok(Box::new(provider))
}

/// Build the routing providers selected by `choice`, in consultation order.
pub(crate) fn build_providers(
    choice: ProviderChoice,
    services: &ServiceConfig,
) -> Result<Vec<Box<dyn RoutingProvider>>, CliError> {
    match choice {
        ProviderChoice::Auto if services.graphhopper_api_key.is_some() => {
            Ok(vec![graphhopper_provider(services)?])
        }
        ProviderChoice::Auto | ProviderChoice::Openrouteservice => {
            Ok(vec![ors_provider(services)?])
        }
        ProviderChoice::Graphhopper => Ok(vec![graphhopper_provider(services)?]),
        ProviderChoice::All => Ok(vec![
            ors_provider(services)?,
            graphhopper_provider(services)?,
        ]),
    }
}

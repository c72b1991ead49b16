//! Geocode command implementation for the runroute CLI.

use std::io::Write;

use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use runroute_core::{Geocoder, LocationInput, Place};
use serde::{Deserialize, Serialize};

use crate::services::{GeocoderChoice, KeyEnvs, ServiceConfig, ServiceOptions, build_geocoder};
use crate::{
    ARG_GEOCODER, ARG_NOMINATIM_BASE_URL, ARG_ORS_API_KEY, ARG_ORS_BASE_URL, ARG_QUERY,
    ARG_TIMEOUT_SECS, CliError, ENV_GEOCODE_ORS_API_KEY, ENV_GEOCODE_QUERY,
};

/// `geocode` never builds a routing provider, so no GraphHopper key applies.
const GEOCODE_KEY_ENVS: KeyEnvs = KeyEnvs {
    ors: ENV_GEOCODE_ORS_API_KEY,
    graphhopper: "",
};

/// CLI arguments for the `geocode` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "geocode",
    long_about = "Resolve an address to coordinates, or describe the place \
                 at a `lat,lon` pair.",
    about = "Look up an address or coordinates"
)]
#[ortho_config(prefix = "RUNROUTE")]
pub(crate) struct GeocodeArgs {
    /// Address, or `lat,lon` for a reverse lookup.
    #[arg(value_name = "query")]
    #[serde(default)]
    pub(crate) query: Option<String>,
    /// Geocoding service.
    #[arg(long = ARG_GEOCODER, value_enum)]
    #[serde(default)]
    pub(crate) geocoder: Option<GeocoderChoice>,
    /// OpenRouteService API key.
    #[arg(long = ARG_ORS_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) ors_api_key: Option<String>,
    /// OpenRouteService root URL.
    #[arg(long = ARG_ORS_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) ors_base_url: Option<String>,
    /// Nominatim root URL.
    #[arg(long = ARG_NOMINATIM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) nominatim_base_url: Option<String>,
    /// HTTP timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

impl GeocodeArgs {
    fn into_config(self) -> Result<GeocodeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        GeocodeConfig::try_from(merged)
    }
}

/// Resolved `geocode` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GeocodeConfig {
    pub(crate) query: String,
    pub(crate) geocoder: GeocoderChoice,
    pub(crate) services: ServiceConfig,
}

impl TryFrom<GeocodeArgs> for GeocodeConfig {
    type Error = CliError;

    fn try_from(args: GeocodeArgs) -> Result<Self, Self::Error> {
        let query = args
            .query
            .filter(|query| !query.trim().is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_QUERY,
                env: ENV_GEOCODE_QUERY,
            })?;
        Ok(Self {
            query,
            geocoder: args.geocoder.unwrap_or_default(),
            services: ServiceConfig::resolve(
                ServiceOptions {
                    ors_api_key: args.ors_api_key,
                    ors_base_url: args.ors_base_url,
                    nominatim_base_url: args.nominatim_base_url,
                    timeout_secs: args.timeout_secs,
                    ..ServiceOptions::default()
                },
                GEOCODE_KEY_ENVS,
            ),
        })
    }
}

/// Builds the geocoder a `geocode` invocation talks to.
pub(crate) trait GeocodeBackend {
    fn geocoder(&self, config: &GeocodeConfig) -> Result<Box<dyn Geocoder>, CliError>;
}

pub(crate) struct HttpGeocodeBackend;

impl GeocodeBackend for HttpGeocodeBackend {
    fn geocoder(&self, config: &GeocodeConfig) -> Result<Box<dyn Geocoder>, CliError> {
        build_geocoder(config.geocoder, &config.services)
    }
}

/// JSON output of `geocode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct GeocodeSummary {
    pub(crate) query: String,
    pub(crate) lat: f64,
    pub(crate) lon: f64,
    pub(crate) label: String,
}

impl GeocodeSummary {
    fn new(query: String, place: Place) -> Self {
        Self {
            query,
            lat: place.point.lat,
            lon: place.point.lon,
            label: place.label,
        }
    }
}

pub(crate) fn run_geocode(args: GeocodeArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_geocode_with(args, &HttpGeocodeBackend, &mut stdout)
}

pub(crate) fn run_geocode_with(
    args: GeocodeArgs,
    backend: &dyn GeocodeBackend,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let geocoder = backend.geocoder(&config)?;
    let place = match LocationInput::parse(&config.query) {
        LocationInput::Coordinates(point) => geocoder.reverse(point),
        LocationInput::Address(address) => geocoder.geocode(&address),
    }
    .map_err(|source| CliError::Geocode {
        input: config.query.clone(),
        source,
    })?;
    crate::write_json(writer, &GeocodeSummary::new(config.query, place))
}

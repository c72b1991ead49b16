//! Plan command implementation for the runroute CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use runroute_core::{
    DEFAULT_DISTANCE_M, DEFAULT_MAX_ATTEMPTS, DEFAULT_TOLERANCE, Geocoder, LocationInput,
    MemoryRouteCache, Pace, PlannedRoute, RouteMode, RoutePlanner, RoutePoint, RouteRequest,
    RoutingProvider, SearchConfig, format_duration,
};
use runroute_data::export::save_gpx;
use serde::{Deserialize, Serialize};

use crate::services::{
    GeocoderChoice, KeyEnvs, ProviderChoice, ServiceConfig, ServiceOptions, build_geocoder,
    build_providers,
};
use crate::{
    ARG_FROM, ARG_GEOCODER, ARG_GRAPHHOPPER_API_KEY, ARG_GRAPHHOPPER_BASE_URL,
    ARG_NOMINATIM_BASE_URL, ARG_ORS_API_KEY, ARG_ORS_BASE_URL, ARG_TIMEOUT_SECS, ARG_TO,
    CliError, ENV_PLAN_FROM, ENV_PLAN_GRAPHHOPPER_API_KEY, ENV_PLAN_ORS_API_KEY, ENV_PLAN_TO,
};

const ARG_MODE: &str = "mode";
const ARG_DISTANCE_KM: &str = "distance-km";
const ARG_TOLERANCE_PERCENT: &str = "tolerance-percent";
const ARG_PACE: &str = "pace";
const ARG_SEED: &str = "seed";
const ARG_PROVIDER: &str = "provider";
const ARG_MAX_ATTEMPTS: &str = "max-attempts";
const ARG_GPX: &str = "gpx";
const ARG_NAME: &str = "name";

const PLAN_KEY_ENVS: KeyEnvs = KeyEnvs {
    ors: ENV_PLAN_ORS_API_KEY,
    graphhopper: ENV_PLAN_GRAPHHOPPER_API_KEY,
};

/// Name given to routes when `--name` is absent.
pub(crate) const DEFAULT_ROUTE_NAME: &str = "Running route";

/// Route shape as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum ModeChoice {
    /// Start and finish at the same place.
    Loop,
    /// Run from `--from` to `--to`.
    PointToPoint,
}

impl From<ModeChoice> for RouteMode {
    fn from(choice: ModeChoice) -> Self {
        match choice {
            ModeChoice::Loop => Self::Loop,
            ModeChoice::PointToPoint => Self::PointToPoint,
        }
    }
}

/// CLI arguments for the `plan` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "plan",
    long_about = "Plan a running route of a target length. Locations are \
                 addresses or `lat,lon` pairs; loops start and finish at \
                 --from, point-to-point routes end at --to. Options can \
                 come from CLI flags, configuration files, or environment \
                 variables.",
    about = "Plan a running route close to a target distance"
)]
#[ortho_config(prefix = "RUNROUTE")]
pub(crate) struct PlanArgs {
    /// Start location: an address or `lat,lon`.
    #[arg(long = ARG_FROM, value_name = "location")]
    #[serde(default)]
    pub(crate) from: Option<String>,
    /// End location for point-to-point routes.
    #[arg(long = ARG_TO, value_name = "location")]
    #[serde(default)]
    pub(crate) to: Option<String>,
    /// Route shape; defaults to point-to-point when --to is given.
    #[arg(long = ARG_MODE, value_enum)]
    #[serde(default)]
    pub(crate) mode: Option<ModeChoice>,
    /// Target distance in kilometres.
    #[arg(long = ARG_DISTANCE_KM, value_name = "km")]
    #[serde(default)]
    pub(crate) distance_km: Option<f64>,
    /// Accepted deviation from the target, in percent.
    #[arg(long = ARG_TOLERANCE_PERCENT, value_name = "percent")]
    #[serde(default)]
    pub(crate) tolerance_percent: Option<f64>,
    /// Running pace as `M:SS` per kilometre.
    #[arg(long = ARG_PACE, value_name = "M:SS")]
    #[serde(default)]
    pub(crate) pace: Option<String>,
    /// Variant selector; change it for a different route.
    #[arg(long = ARG_SEED)]
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    /// Routing service to use.
    #[arg(long = ARG_PROVIDER, value_enum)]
    #[serde(default)]
    pub(crate) provider: Option<ProviderChoice>,
    /// Maximum provider calls per routing service.
    #[arg(long = ARG_MAX_ATTEMPTS, value_name = "count")]
    #[serde(default)]
    pub(crate) max_attempts: Option<usize>,
    /// Write the route as GPX to this path.
    #[arg(long = ARG_GPX, value_name = "path")]
    #[serde(default)]
    pub(crate) gpx: Option<Utf8PathBuf>,
    /// Route name recorded in the summary and the GPX metadata.
    #[arg(long = ARG_NAME)]
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// Geocoding service for addresses.
    #[arg(long = ARG_GEOCODER, value_enum)]
    #[serde(default)]
    pub(crate) geocoder: Option<GeocoderChoice>,
    /// OpenRouteService API key.
    #[arg(long = ARG_ORS_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) ors_api_key: Option<String>,
    /// OpenRouteService root URL, for self-hosted instances.
    #[arg(long = ARG_ORS_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) ors_base_url: Option<String>,
    /// GraphHopper API key.
    #[arg(long = ARG_GRAPHHOPPER_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) graphhopper_api_key: Option<String>,
    /// GraphHopper root URL.
    #[arg(long = ARG_GRAPHHOPPER_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) graphhopper_base_url: Option<String>,
    /// Nominatim root URL.
    #[arg(long = ARG_NOMINATIM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) nominatim_base_url: Option<String>,
    /// HTTP timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

impl PlanArgs {
    pub(crate) fn into_config(self) -> Result<PlanConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        PlanConfig::try_from(merged)
    }
}

/// Resolved `plan` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlanConfig {
    pub(crate) from: LocationInput,
    pub(crate) to: Option<LocationInput>,
    pub(crate) mode: RouteMode,
    pub(crate) distance_m: f64,
    pub(crate) tolerance: f64,
    pub(crate) pace: Pace,
    pub(crate) seed: u64,
    pub(crate) provider: ProviderChoice,
    pub(crate) geocoder: GeocoderChoice,
    pub(crate) max_attempts: usize,
    pub(crate) gpx: Option<Utf8PathBuf>,
    pub(crate) name: String,
    pub(crate) services: ServiceConfig,
}

impl TryFrom<PlanArgs> for PlanConfig {
    type Error = CliError;

    fn try_from(args: PlanArgs) -> Result<Self, Self::Error> {
        let from = args.from.ok_or(CliError::MissingArgument {
            field: ARG_FROM,
            env: ENV_PLAN_FROM,
        })?;
        let to = args.to.filter(|to| !to.trim().is_empty());
        let mode = args.mode.map_or_else(
            || {
                if to.is_some() {
                    RouteMode::PointToPoint
                } else {
                    RouteMode::Loop
                }
            },
            RouteMode::from,
        );
        if mode == RouteMode::PointToPoint && to.is_none() {
            return Err(CliError::MissingArgument {
                field: ARG_TO,
                env: ENV_PLAN_TO,
            });
        }

        let distance_m = args
            .distance_km
            .map_or(DEFAULT_DISTANCE_M, |km| km * 1_000.0);
        let tolerance = args
            .tolerance_percent
            .map_or(DEFAULT_TOLERANCE, |percent| percent / 100.0);
        let pace = match args.pace {
            Some(value) => value
                .parse::<Pace>()
                .map_err(|source| CliError::InvalidPace { value, source })?,
            None => Pace::default(),
        };
        let max_attempts = match args.max_attempts {
            Some(0) => {
                return Err(CliError::InvalidArgument {
                    field: ARG_MAX_ATTEMPTS,
                    value: "0".to_owned(),
                    reason: "at least one attempt is needed".to_owned(),
                });
            }
            Some(count) => count,
            None => DEFAULT_MAX_ATTEMPTS,
        };

        let services = ServiceConfig::resolve(
            ServiceOptions {
                ors_api_key: args.ors_api_key,
                ors_base_url: args.ors_base_url,
                graphhopper_api_key: args.graphhopper_api_key,
                graphhopper_base_url: args.graphhopper_base_url,
                nominatim_base_url: args.nominatim_base_url,
                timeout_secs: args.timeout_secs,
            },
            PLAN_KEY_ENVS,
        );

        Ok(Self {
            from: LocationInput::parse(&from),
            to: to.as_deref().map(LocationInput::parse),
            mode,
            distance_m,
            tolerance,
            pace,
            seed: args.seed.unwrap_or(0),
            provider: args.provider.unwrap_or_default(),
            geocoder: args.geocoder.unwrap_or_default(),
            max_attempts,
            gpx: args.gpx,
            name: args
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ROUTE_NAME.to_owned()),
            services,
        })
    }
}

impl PlanConfig {
    fn route_request(
        &self,
        start: RoutePoint,
        end: Option<RoutePoint>,
    ) -> Result<RouteRequest, CliError> {
        let request = match (self.mode, end) {
            (RouteMode::PointToPoint, Some(end)) => {
                RouteRequest::point_to_point(start, end, self.distance_m)?
            }
            (RouteMode::PointToPoint, None) => {
                return Err(CliError::MissingArgument {
                    field: ARG_TO,
                    env: ENV_PLAN_TO,
                });
            }
            (RouteMode::Loop, _) => RouteRequest::new(start, self.distance_m)?,
        };
        Ok(request
            .with_tolerance(self.tolerance)?
            .with_pace(self.pace)
            .with_seed(self.seed))
    }
}

/// Builds the services a `plan` invocation talks to.
pub(crate) trait PlanBackend {
    fn geocoder(&self, config: &PlanConfig) -> Result<Box<dyn Geocoder>, CliError>;
    fn providers(&self, config: &PlanConfig) -> Result<Vec<Box<dyn RoutingProvider>>, CliError>;
}

/// Backend using the real HTTP adapters.
pub(crate) struct HttpPlanBackend;

impl PlanBackend for HttpPlanBackend {
    fn geocoder(&self, config: &PlanConfig) -> Result<Box<dyn Geocoder>, CliError> {
        build_geocoder(config.geocoder, &config.services)
    }

    fn providers(&self, config: &PlanConfig) -> Result<Vec<Box<dyn RoutingProvider>>, CliError> {
        build_providers(config.provider, &config.services)
    }
}

/// JSON summary printed by `plan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PlanSummary {
    pub(crate) name: String,
    pub(crate) mode: RouteMode,
    pub(crate) provider: String,
    pub(crate) target_distance_m: f64,
    pub(crate) distance_m: f64,
    pub(crate) duration_s: u64,
    pub(crate) duration: String,
    pub(crate) pace: String,
    pub(crate) elevation_gain_m: f64,
    pub(crate) elevation_loss_m: f64,
    pub(crate) min_elevation_m: Option<f64>,
    pub(crate) max_elevation_m: Option<f64>,
    pub(crate) point_count: usize,
    pub(crate) attempts: usize,
    pub(crate) from_cache: bool,
    pub(crate) within_tolerance: bool,
    pub(crate) notice: Option<String>,
    pub(crate) gpx: Option<Utf8PathBuf>,
}

impl PlanSummary {
    fn new(config: &PlanConfig, request: &RouteRequest, planned: &PlannedRoute) -> Self {
        Self {
            name: config.name.clone(),
            mode: request.mode(),
            provider: planned.result.provider.clone(),
            target_distance_m: request.target_distance_m(),
            distance_m: planned.result.distance_m,
            duration_s: planned.stats.duration.as_secs(),
            duration: format_duration(planned.stats.duration),
            pace: request.pace().to_string(),
            elevation_gain_m: planned.stats.elevation_gain_m,
            elevation_loss_m: planned.stats.elevation_loss_m,
            min_elevation_m: planned.stats.min_elevation_m,
            max_elevation_m: planned.stats.max_elevation_m,
            point_count: planned.result.points.len(),
            attempts: planned.attempts,
            from_cache: planned.from_cache,
            within_tolerance: planned.shortfall.is_none(),
            notice: planned.shortfall.as_ref().map(ToString::to_string),
            gpx: config.gpx.clone(),
        }
    }
}

pub(crate) fn run_plan(args: PlanArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_plan_with(args, &HttpPlanBackend, &mut stdout)
}

pub(crate) fn run_plan_with(
    args: PlanArgs,
    backend: &dyn PlanBackend,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let summary = execute_plan(&config, backend)?;
    crate::write_json(writer, &summary)
}

fn execute_plan(config: &PlanConfig, backend: &dyn PlanBackend) -> Result<PlanSummary, CliError> {
    let (start, end) = resolve_endpoints(config, backend)?;
    let request = config.route_request(start, end)?;
    let providers = backend.providers(config)?;
    let mut planner = RoutePlanner::with_cache(providers, MemoryRouteCache::new())
        .with_search_config(SearchConfig::with_max_attempts(config.max_attempts));
    let planned = planner.plan(&request)?;
    log::info!(
        "planned {:.0} m {} route via {}",
        planned.result.distance_m,
        request.mode(),
        planned.result.provider
    );
    if let Some(path) = &config.gpx {
        save_gpx(path, &planned.result, &planned.stats, &config.name).map_err(|source| {
            CliError::ExportGpx {
                path: path.clone(),
                source,
            }
        })?;
    }
    Ok(PlanSummary::new(config, &request, &planned))
}

/// Resolve `--from` and `--to`, building a geocoder only when an address
/// needs one.
fn resolve_endpoints(
    config: &PlanConfig,
    backend: &dyn PlanBackend,
) -> Result<(RoutePoint, Option<RoutePoint>), CliError> {
    let mut geocoder = None;
    let start = resolve_location(&config.from, config, backend, &mut geocoder)?;
    let end = match (config.mode, &config.to) {
        (RouteMode::PointToPoint, Some(to)) => {
            Some(resolve_location(to, config, backend, &mut geocoder)?)
        }
        _ => None,
    };
    Ok((start, end))
}

fn resolve_location(
    input: &LocationInput,
    config: &PlanConfig,
    backend: &dyn PlanBackend,
    cached: &mut Option<Box<dyn Geocoder>>,
) -> Result<RoutePoint, CliError> {
    let address = match input {
        LocationInput::Coordinates(point) => return Ok(*point),
        LocationInput::Address(address) => address,
    };
    let geocoder = match cached.take() {
        Some(geocoder) => geocoder,
        None => backend.geocoder(config)?,
    };
    let resolved = input
        .resolve(geocoder.as_ref())
        .map_err(|source| CliError::Geocode {
            input: address.clone(),
            source,
        });
    *cached = Some(geocoder);
    resolved
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<PlanConfig, CliError> {
    let merged = PlanArgs::merge_from_layers(layers).map_err(CliError::from)?;
    PlanConfig::try_from(merged)
}

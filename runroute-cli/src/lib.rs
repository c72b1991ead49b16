//! Command-line interface for planning running routes.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use serde::Serialize;

mod error;
mod geocode;
mod plan;
mod services;

pub use error::CliError;

use geocode::{GeocodeArgs, run_geocode};
use plan::{PlanArgs, run_plan};

const ARG_FROM: &str = "from";
const ARG_TO: &str = "to";
const ARG_QUERY: &str = "query";
const ARG_GEOCODER: &str = "geocoder";
const ARG_ORS_API_KEY: &str = "ors-api-key";
const ARG_ORS_BASE_URL: &str = "ors-base-url";
const ARG_GRAPHHOPPER_API_KEY: &str = "graphhopper-api-key";
const ARG_GRAPHHOPPER_BASE_URL: &str = "graphhopper-base-url";
const ARG_NOMINATIM_BASE_URL: &str = "nominatim-base-url";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";

const ENV_PLAN_FROM: &str = "RUNROUTE_CMDS_PLAN_FROM";
const ENV_PLAN_TO: &str = "RUNROUTE_CMDS_PLAN_TO";
const ENV_PLAN_ORS_API_KEY: &str = "RUNROUTE_CMDS_PLAN_ORS_API_KEY";
const ENV_PLAN_GRAPHHOPPER_API_KEY: &str = "RUNROUTE_CMDS_PLAN_GRAPHHOPPER_API_KEY";
const ENV_GEOCODE_QUERY: &str = "RUNROUTE_CMDS_GEOCODE_QUERY";
const ENV_GEOCODE_ORS_API_KEY: &str = "RUNROUTE_CMDS_GEOCODE_ORS_API_KEY";

/// Run the runroute CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Plan(args) => run_plan(args),
        Command::Geocode(args) => run_geocode(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "runroute",
    about = "Plan running routes of a chosen length",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan a loop or point-to-point route close to a target distance.
    Plan(PlanArgs),
    /// Resolve an address or describe a coordinate pair.
    Geocode(GeocodeArgs),
}

/// Pretty-print `value` as JSON followed by a newline.
pub(crate) fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writeln!(writer, "{payload}").map_err(CliError::WriteOutput)
}

#[cfg(test)]
mod tests;

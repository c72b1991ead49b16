//! Error types emitted by the runroute CLI.
//!
//! Many CLI helpers return `Result<_, CliError>`, so large payloads stay
//! behind their source errors rather than being copied in.

use std::sync::Arc;

use camino::Utf8PathBuf;
use runroute_core::{GeocodeError, PaceError, PlanError, RequestError};
use runroute_data::ProviderBuildError;
use runroute_data::export::ExportError;
use thiserror::Error;

/// Errors emitted by the runroute CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option is present but its value is unusable.
    #[error("invalid --{field} {value:?}: {reason}")]
    InvalidArgument {
        field: &'static str,
        value: String,
        reason: String,
    },
    /// The pace is not in `M:SS` form.
    #[error("invalid pace {value:?}: {source}")]
    InvalidPace {
        value: String,
        #[source]
        source: PaceError,
    },
    /// The route parameters were rejected.
    #[error("invalid route request: {0}")]
    InvalidRequest(#[from] RequestError),
    /// Resolving an address failed.
    #[error("could not resolve {input:?}: {source}")]
    Geocode {
        input: String,
        #[source]
        source: GeocodeError,
    },
    /// Constructing an HTTP adapter failed.
    #[error("failed to build {service} client: {source}")]
    BuildAdapter {
        service: &'static str,
        #[source]
        source: ProviderBuildError,
    },
    /// Planning the route failed.
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// Writing the GPX file failed.
    #[error("failed to export GPX to {path}: {source}")]
    ExportGpx {
        path: Utf8PathBuf,
        #[source]
        source: ExportError,
    },
    /// Serialising the command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing the command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}

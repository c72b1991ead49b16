use thiserror::Error;

use crate::{GeocodeError, RequestError, SearchError, StatsError};

/// Errors surfaced by [`crate::RoutePlanner`] and the front ends built on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// An address could not be resolved.
    #[error("geocoding failed: {0}")]
    GeocodeFailed(#[from] GeocodeError),
    /// The request parameters were rejected.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),
    /// The search ended without any route.
    #[error(transparent)]
    Search(#[from] SearchError),
    /// The chosen route carried an unusable elevation profile.
    #[error(transparent)]
    InvalidProfile(#[from] StatsError),
    /// The planner was built without a routing provider.
    #[error("no routing provider configured")]
    NoProvider,
}

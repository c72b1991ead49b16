//! Core domain types and planning logic for runroute.
//!
//! This crate is synchronous and performs no I/O. Routing services and
//! geocoders are reached through the [`RoutingProvider`] and [`Geocoder`]
//! traits, implemented over HTTP by `runroute-data` and by deterministic
//! stubs in [`test_support`]. Constructors return `Result` so invalid
//! coordinates, distances and tolerances are rejected before any provider is
//! called.

mod cache;
mod error;
mod geocode;
mod planner;
mod point;
mod request;
mod route;
pub mod routing;
mod search;
pub mod stats;

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;

pub use cache::{MemoryRouteCache, RequestFingerprint, RouteCache};
pub use error::PlanError;
pub use geocode::{GeocodeError, Geocoder, LocationInput, Place};
pub use planner::{PlannedRoute, RoutePlanner};
pub use point::{PointError, RoutePoint, path_length};
pub use request::{
    DEFAULT_DISTANCE_M, DEFAULT_TOLERANCE, MAX_TARGET_DISTANCE_M, MIN_TARGET_DISTANCE_M, Pace,
    PaceError, RequestError, RouteMode, RouteRequest,
};
pub use route::RouteResult;
pub use routing::{ProviderError, RouteQuery, RoutingProvider};
pub use search::{
    DEFAULT_MAX_ATTEMPTS, SearchConfig, SearchError, SearchOutcome, ToleranceNotMet, search_route,
};
pub use stats::{RouteStats, StatsError, elevation_gain, format_duration, route_stats};

//! Facade crate for the runroute route planner.
//!
//! This crate re-exports the core planning types and, behind the `http`
//! feature, the OpenRouteService, GraphHopper and Nominatim adapters together
//! with GPX export.

#![forbid(unsafe_code)]

pub use runroute_core::{
    Geocoder, LocationInput, Pace, Place, PlanError, PlannedRoute, RouteMode, RoutePlanner,
    RoutePoint, RouteRequest, RouteResult, RouteStats, RoutingProvider, SearchConfig,
    format_duration, route_stats,
};

#[cfg(feature = "http")]
pub use runroute_data::export::{export_gpx, load_gpx_track, save_gpx};
#[cfg(feature = "http")]
pub use runroute_data::geocoding::{NominatimGeocoder, OrsGeocoder};
#[cfg(feature = "http")]
pub use runroute_data::routing::{GraphHopperRoutingProvider, OrsRoutingProvider};

//! HTTP routing providers.
//!
//! [`OrsRoutingProvider`] talks to OpenRouteService and
//! [`GraphHopperRoutingProvider`] to GraphHopper. Both implement the
//! synchronous [`runroute_core::RoutingProvider`] trait by blocking on
//! asynchronous HTTP calls internally.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use runroute_core::{RoutePlanner, RoutePoint, RouteRequest};
//! use runroute_data::routing::{OrsConfig, OrsRoutingProvider};
//!
//! let config = OrsConfig::new("my-api-key").with_timeout(Duration::from_secs(60));
//! let mut planner = RoutePlanner::new(Box::new(OrsRoutingProvider::with_config(config)?));
//!
//! let request = RouteRequest::new(RoutePoint::new(59.3293, 18.0686)?, 8_000.0)?;
//! let planned = planner.plan(&request)?;
//! println!("{:.0} m in {:?}", planned.result.distance_m, planned.stats.duration);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod graphhopper;
mod openrouteservice;
mod ors;

use runroute_core::{ProviderError, RoutePoint};

pub use graphhopper::{
    DEFAULT_GRAPHHOPPER_BASE_URL, DEFAULT_GRAPHHOPPER_PROFILE, GraphHopperConfig,
    GraphHopperRoutingProvider,
};
pub use openrouteservice::{
    DEFAULT_ORS_BASE_URL, DEFAULT_ORS_PROFILE, OrsConfig, OrsRoutingProvider,
};

/// Decode GeoJSON-style `[lon, lat, elevation?]` positions.
pub(crate) fn positions_to_points(positions: &[Vec<f64>]) -> Result<Vec<RoutePoint>, ProviderError> {
    positions
        .iter()
        .map(|position| match position.as_slice() {
            [lon, lat, rest @ ..] => RoutePoint::new(*lat, *lon)
                .map(|point| point.with_elevation(rest.first().copied()))
                .map_err(|err| ProviderError::ParseError {
                    message: err.to_string(),
                }),
            _ => Err(ProviderError::ParseError {
                message: format!("position {position:?} has fewer than two components"),
            }),
        })
        .collect()
}

//! Routes returned by a routing provider.
//!
//! A [`RouteResult`] aggregates the ordered geometry with the distance and
//! climb the provider reported.

use serde::{Deserialize, Serialize};

use crate::point::{RoutePoint, path_length};
use crate::stats::elevation_gain;

/// A route as returned by a provider.
///
/// # Examples
/// ```
/// use runroute_core::{RoutePoint, RouteResult};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let a = RoutePoint::new(0.0, 0.0)?.with_elevation(Some(10.0));
/// let b = RoutePoint::new(0.0, 0.01)?.with_elevation(Some(14.0));
/// let route = RouteResult::new(vec![a, b], 0.0, None, "stub");
///
/// // Zero distances fall back to the geometry length.
/// assert!(route.distance_m > 1_000.0);
/// assert_eq!(route.elevation_gain_m, 4.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Ordered path geometry.
    pub points: Vec<RoutePoint>,
    /// Total distance in metres.
    pub distance_m: f64,
    /// Cumulative climb in metres.
    pub elevation_gain_m: f64,
    /// Name of the provider that produced the route.
    pub provider: String,
    /// Untouched provider payload, kept for diagnostics.
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl RouteResult {
    /// Construct a route, filling in missing distance and climb.
    ///
    /// A non-positive `distance_m` is replaced by the haversine length of
    /// `points`; a missing or non-positive `ascent_m` by the climb derived
    /// from the elevation samples.
    pub fn new(
        points: Vec<RoutePoint>,
        distance_m: f64,
        ascent_m: Option<f64>,
        provider: impl Into<String>,
    ) -> Self {
        let distance_m = if distance_m > 0.0 {
            distance_m
        } else {
            path_length(&points)
        };
        let elevation_gain_m = match ascent_m {
            Some(ascent) if ascent > 0.0 => ascent,
            _ => elevation_gain(&points),
        };
        Self {
            points,
            distance_m,
            elevation_gain_m,
            provider: provider.into(),
            raw: serde_json::Value::Null,
        }
    }

    /// Attach the raw provider payload.
    #[must_use]
    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = raw;
        self
    }

    /// Elevation samples in path order, skipping points without one.
    pub fn elevation_profile(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().filter_map(|point| point.elevation)
    }
}

//! Geographic points along a route.
//!
//! A [`RoutePoint`] is a validated WGS-84 position with an optional elevation
//! sample. Points are produced by geocoding, by parsing a `lat,lon` input or
//! by decoding a provider's route geometry.

use std::fmt;
use std::str::FromStr;

use geo::{Bearing, Destination, Distance, Haversine, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A position on the route with an optional elevation in metres.
///
/// # Examples
///
/// ```
/// use runroute_core::RoutePoint;
///
/// # fn main() -> Result<(), runroute_core::PointError> {
/// let point = RoutePoint::new(59.3293, 18.0686)?;
/// assert_eq!(point.lat, 59.3293);
/// assert!(point.elevation.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct RoutePoint {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Elevation above sea level in metres, when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

/// Errors returned by [`RoutePoint::new`] and [`RoutePoint::from_str`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PointError {
    /// Latitude was outside `[-90, 90]` or not finite.
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    /// Longitude was outside `[-180, 180]` or not finite.
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
    /// Text input was not a `lat,lon` pair.
    #[error("expected `lat,lon`, got {0:?}")]
    Format(String),
}

/// Unchecked wire form of a [`RoutePoint`].
#[derive(Deserialize)]
struct RawPoint {
    lat: f64,
    lon: f64,
    #[serde(default)]
    elevation: Option<f64>,
}

impl TryFrom<RawPoint> for RoutePoint {
    type Error = PointError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Ok(Self::new(raw.lat, raw.lon)?.with_elevation(raw.elevation))
    }
}

impl RoutePoint {
    /// Validates and constructs a [`RoutePoint`] without elevation.
    pub fn new(lat: f64, lon: f64) -> Result<Self, PointError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(PointError::Latitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(PointError::Longitude(lon));
        }
        Ok(Self {
            lat,
            lon,
            elevation: None,
        })
    }

    /// Attach an elevation sample.
    #[must_use]
    pub fn with_elevation(mut self, elevation: Option<f64>) -> Self {
        self.elevation = elevation;
        self
    }

    /// Convert to a `geo` point (`x` = longitude, `y` = latitude).
    #[must_use]
    pub fn to_geo(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// Great-circle distance to `other` in metres.
    #[must_use]
    pub fn haversine_distance(self, other: Self) -> f64 {
        Haversine.distance(self.to_geo(), other.to_geo())
    }

    /// Initial bearing towards `other` in degrees clockwise from north.
    #[must_use]
    pub fn bearing_to(self, other: Self) -> f64 {
        Haversine.bearing(self.to_geo(), other.to_geo())
    }

    /// The point reached by travelling `distance_m` metres on `bearing`.
    #[must_use]
    pub fn destination(self, bearing: f64, distance_m: f64) -> Self {
        let target = Haversine.destination(self.to_geo(), bearing, distance_m);
        Self {
            lat: target.y(),
            lon: target.x(),
            elevation: None,
        }
    }

    /// Midpoint between two points, ignoring elevation.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        let half = self.haversine_distance(other) / 2.0;
        self.destination(self.bearing_to(other), half)
    }
}

impl fmt::Display for RoutePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

impl FromStr for RoutePoint {
    type Err = PointError;

    /// Parse a `lat,lon` pair, tolerating whitespace around either value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_error = || PointError::Format(s.to_owned());
        let (lat, lon) = s.split_once(',').ok_or_else(format_error)?;
        let lat: f64 = lat.trim().parse().map_err(|_| format_error())?;
        let lon: f64 = lon.trim().parse().map_err(|_| format_error())?;
        Self::new(lat, lon)
    }
}

/// Haversine length of a polyline in metres.
///
/// Used when a provider reports a zero distance for a non-empty geometry.
#[must_use]
pub fn path_length(points: &[RoutePoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| match pair {
            [a, b] => a.haversine_distance(*b),
            _ => 0.0,
        })
        .sum()
}

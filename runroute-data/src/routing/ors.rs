//! OpenRouteService directions payloads.
//!
//! Requests go to `POST /v2/directions/{profile}/geojson`; successful
//! responses are a GeoJSON `FeatureCollection` whose first feature carries the
//! route geometry (`[lon, lat, elevation]` triples) and its summary.
//!
//! See: <https://openrouteservice.org/dev/#/api-docs/v2/directions>

use serde::{Deserialize, Serialize};

/// Service error code for "no routable point near a coordinate".
pub const CODE_POINT_NOT_FOUND: u32 = 2010;
/// Service error code for "no route between the points".
pub const CODE_ROUTE_NOT_FOUND: u32 = 2009;
/// Service error code for exceeded request limits (e.g. loop length).
pub const CODE_LIMIT_EXCEEDED: u32 = 2004;

/// Body of a directions request.
#[derive(Debug, Serialize)]
pub struct DirectionsRequest {
    /// `[lon, lat]` pairs in visiting order.
    pub coordinates: Vec<[f64; 2]>,
    /// Ask for a third, elevation, component in the geometry.
    pub elevation: bool,
    /// Turn-by-turn instructions are never used.
    pub instructions: bool,
    /// Round-trip options; absent for point-to-point routes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<DirectionsOptions>,
}

/// The `options` object of a directions request.
#[derive(Debug, Serialize)]
pub struct DirectionsOptions {
    /// Round-trip generation parameters.
    pub round_trip: RoundTripOptions,
}

/// Parameters steering round-trip generation.
#[derive(Debug, Serialize)]
pub struct RoundTripOptions {
    /// Target length in metres.
    pub length: f64,
    /// Number of intermediate points used to shape the loop.
    pub points: u32,
    /// Randomisation seed for the loop direction.
    pub seed: u64,
}

impl RoundTripOptions {
    /// Shape a loop of `length_m` metres with one control point per 2 km,
    /// between two and five points.
    pub fn for_length(length_m: f64, seed: u64) -> Self {
        let points = (length_m / 2_000.0).floor().clamp(2.0, 5.0) as u32;
        Self {
            length: length_m,
            points,
            seed,
        }
    }
}

/// Successful directions response.
#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    /// Route features; the first is the requested route.
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// A single route feature.
#[derive(Debug, Deserialize)]
pub struct Feature {
    /// Route geometry.
    pub geometry: Geometry,
    /// Route summary and climb.
    #[serde(default)]
    pub properties: Properties,
}

/// A GeoJSON `LineString`.
#[derive(Debug, Deserialize)]
pub struct Geometry {
    /// `[lon, lat]` or `[lon, lat, elevation]` positions.
    pub coordinates: Vec<Vec<f64>>,
}

/// Properties of a route feature.
#[derive(Debug, Default, Deserialize)]
pub struct Properties {
    /// Distance and duration totals.
    #[serde(default)]
    pub summary: Summary,
    /// Total climb in metres, present when elevation was requested.
    pub ascent: Option<f64>,
    /// Total descent in metres, present when elevation was requested.
    pub descent: Option<f64>,
}

/// Route totals.
#[derive(Debug, Default, Deserialize)]
pub struct Summary {
    /// Distance in metres; omitted by the service for zero-length routes.
    #[serde(default)]
    pub distance: f64,
    /// Duration in seconds at the profile's speed.
    #[serde(default)]
    pub duration: f64,
}

/// Error payload returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Structured or plain-text error.
    pub error: ErrorDetail,
}

/// The `error` member, which older gateways send as a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    /// `{"code": 2010, "message": "..."}`.
    Coded {
        /// Service error code.
        code: u32,
        /// Human-readable description.
        #[serde(default)]
        message: String,
    },
    /// A plain message.
    Message(String),
}

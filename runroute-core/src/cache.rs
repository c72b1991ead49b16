//! Memoised routes keyed by a normalised request fingerprint.
//!
//! Entries never expire; a cache lives as long as the planner that owns it.

use std::collections::HashMap;

use crate::{RouteMode, RoutePoint, RouteRequest, RouteResult};

/// Hashable identity of a [`RouteRequest`] and the providers asked.
///
/// Floating-point parameters are quantised so that requests differing only
/// by representation noise share an entry: coordinates to micro-degrees,
/// distance to whole metres, tolerance to basis points. Pace is left out
/// because it only affects the statistics derived after a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestFingerprint {
    mode: RouteMode,
    start: (i64, i64),
    end: Option<(i64, i64)>,
    distance_m: i64,
    tolerance_bp: i64,
    seed: u64,
    providers: String,
}

impl RequestFingerprint {
    /// Fingerprint `request` as answered by the named providers.
    #[must_use]
    pub fn new(request: &RouteRequest, providers: &[&str]) -> Self {
        Self {
            mode: request.mode(),
            start: micro_degrees(request.start()),
            end: request.end().map(micro_degrees),
            distance_m: quantise(request.target_distance_m(), 1.0),
            tolerance_bp: quantise(request.tolerance(), 10_000.0),
            seed: request.seed(),
            providers: providers.join("+"),
        }
    }
}

// Inputs are validated coordinates, distances and fractions, far inside
// the `i64` range.
fn quantise(value: f64, scale: f64) -> i64 {
    (value * scale).round() as i64
}

fn micro_degrees(point: RoutePoint) -> (i64, i64) {
    (quantise(point.lat, 1e6), quantise(point.lon, 1e6))
}

/// Storage for previously planned routes.
pub trait RouteCache {
    /// Look up a route; `None` on a miss.
    fn get(&self, key: &RequestFingerprint) -> Option<RouteResult>;

    /// Store `result`, replacing any previous entry for `key`.
    fn put(&mut self, key: RequestFingerprint, result: RouteResult);

    /// Number of stored routes.
    fn len(&self) -> usize;

    /// Whether the cache holds no routes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded in-memory [`RouteCache`].
#[derive(Debug, Default, Clone)]
pub struct MemoryRouteCache {
    entries: HashMap<RequestFingerprint, RouteResult>,
}

impl MemoryRouteCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RouteCache for MemoryRouteCache {
    fn get(&self, key: &RequestFingerprint) -> Option<RouteResult> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: RequestFingerprint, result: RouteResult) {
        self.entries.insert(key, result);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

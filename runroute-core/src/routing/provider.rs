//! Routing provider trait and the queries it answers.

use std::rc::Rc;

use crate::{RoutePoint, RouteResult};

use super::error::ProviderError;

/// A single routing call.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteQuery {
    /// A round trip from `start` of roughly `length_m` metres.
    ///
    /// `seed` selects the overall direction; different seeds produce
    /// different loops for the same length.
    RoundTrip {
        /// Start and finish of the loop.
        start: RoutePoint,
        /// Requested loop length in metres.
        length_m: f64,
        /// Variation seed forwarded to the service.
        seed: u64,
    },
    /// A path visiting `waypoints` in order (at least two).
    Path {
        /// Start, optional via points, and end.
        waypoints: Vec<RoutePoint>,
    },
}

impl RouteQuery {
    /// Path between two points without detours.
    #[must_use]
    pub fn direct(start: RoutePoint, end: RoutePoint) -> Self {
        Self::Path {
            waypoints: vec![start, end],
        }
    }

    /// Path between two points through a single via point.
    #[must_use]
    pub fn via(start: RoutePoint, via: RoutePoint, end: RoutePoint) -> Self {
        Self::Path {
            waypoints: vec![start, via, end],
        }
    }
}

/// Fetch a route from an external service.
///
/// Implementations block the caller until the service answers; retries are
/// the caller's responsibility.
///
/// # Examples
///
/// ```rust
/// use runroute_core::{ProviderError, RoutePoint, RouteQuery, RouteResult, RoutingProvider};
///
/// /// Answers every round trip with a loop of exactly the requested length.
/// struct PerfectProvider;
///
/// impl RoutingProvider for PerfectProvider {
///     fn name(&self) -> &str {
///         "perfect"
///     }
///
///     fn route(&self, query: &RouteQuery) -> Result<RouteResult, ProviderError> {
///         match query {
///             RouteQuery::RoundTrip { start, length_m, .. } => {
///                 Ok(RouteResult::new(vec![*start, *start], *length_m, None, self.name()))
///             }
///             RouteQuery::Path { .. } => Err(ProviderError::NoRoute {
///                 message: "paths unsupported".into(),
///             }),
///         }
///     }
/// }
///
/// let start = RoutePoint::new(59.33, 18.07)?;
/// let route = PerfectProvider.route(&RouteQuery::RoundTrip { start, length_m: 5_000.0, seed: 0 })?;
/// assert_eq!(route.distance_m, 5_000.0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait RoutingProvider {
    /// Short provider name recorded on each [`RouteResult`].
    fn name(&self) -> &str;

    /// Shortest target distance the service will plan, in metres.
    fn min_distance_m(&self) -> f64 {
        crate::MIN_TARGET_DISTANCE_M
    }

    /// Longest target distance the service will plan, in metres.
    fn max_distance_m(&self) -> f64 {
        crate::MAX_TARGET_DISTANCE_M
    }

    /// Answer a single routing query.
    fn route(&self, query: &RouteQuery) -> Result<RouteResult, ProviderError>;
}

impl<P: RoutingProvider + ?Sized> RoutingProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn min_distance_m(&self) -> f64 {
        (**self).min_distance_m()
    }

    fn max_distance_m(&self) -> f64 {
        (**self).max_distance_m()
    }

    fn route(&self, query: &RouteQuery) -> Result<RouteResult, ProviderError> {
        (**self).route(query)
    }
}

impl<P: RoutingProvider + ?Sized> RoutingProvider for Rc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn min_distance_m(&self) -> f64 {
        (**self).min_distance_m()
    }

    fn max_distance_m(&self) -> f64 {
        (**self).max_distance_m()
    }

    fn route(&self, query: &RouteQuery) -> Result<RouteResult, ProviderError> {
        (**self).route(query)
    }
}

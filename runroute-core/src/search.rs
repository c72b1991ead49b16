//! Distance-tolerance search.
//!
//! Routing services treat a requested length as a hint: a loop asked for at
//! 5 km may come back at 4.2 km or 6.1 km depending on the street network.
//! [`search_route`] repeatedly queries a [`RoutingProvider`], adjusting the
//! request from each observed distance, until a route falls within the
//! tolerance band or the attempt budget runs out.
//!
//! Loops rescale the requested length by `target / actual` and advance the
//! seed on every attempt, starting from a block of seeds reserved for the
//! request's variant. Point-to-point routes start with the direct path
//! and, when it is too short, detour through a via point offset sideways
//! from the midpoint, alternating sides between attempts.

use thiserror::Error;

use crate::{
    ProviderError, RouteMode, RoutePoint, RouteQuery, RouteRequest, RouteResult, RoutingProvider,
};

/// Default number of provider calls per search.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Bounds applied to each rescaling step.
const MIN_SCALE: f64 = 0.5;
const MAX_SCALE: f64 = 2.0;

/// Tuning for [`search_route`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Maximum number of provider calls.
    pub max_attempts: usize,
}

impl SearchConfig {
    /// Limit the search to `max_attempts` provider calls (at least one).
    #[must_use]
    pub const fn with_max_attempts(max_attempts: usize) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Notice attached to a best-effort route outside the tolerance band.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error(
    "closest route is {distance_m:.0} m, outside ±{:.1} % of the {target_m:.0} m target",
    .tolerance * 100.0
)]
pub struct ToleranceNotMet {
    /// Requested distance in metres.
    pub target_m: f64,
    /// Distance of the returned route in metres.
    pub distance_m: f64,
    /// Allowed fractional deviation.
    pub tolerance: f64,
}

impl ToleranceNotMet {
    /// Check `distance_m` against `request`, yielding a notice when it
    /// falls outside the band.
    #[must_use]
    pub fn check(request: &RouteRequest, distance_m: f64) -> Option<Self> {
        (!request.accepts(distance_m)).then(|| Self {
            target_m: request.target_distance_m(),
            distance_m,
            tolerance: request.tolerance(),
        })
    }
}

/// Result of a completed search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Accepted route, or the closest candidate when the budget ran out.
    pub result: RouteResult,
    /// Provider calls made, including failed ones.
    pub attempts: usize,
    /// Present when `result` is outside the tolerance band.
    pub shortfall: Option<ToleranceNotMet>,
}

impl SearchOutcome {
    /// Whether the route satisfies the requested tolerance.
    #[must_use]
    pub const fn within_tolerance(&self) -> bool {
        self.shortfall.is_none()
    }
}

/// Failures that leave the search without any route.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// The target is outside what the provider supports.
    #[error("{provider} cannot plan {distance_m:.0} m routes (supported range {min_m:.0}-{max_m:.0} m)")]
    InvalidDistance {
        /// Provider name.
        provider: String,
        /// Requested distance in metres.
        distance_m: f64,
        /// Provider minimum in metres.
        min_m: f64,
        /// Provider maximum in metres.
        max_m: f64,
    },
    /// Every attempt came back without a route.
    #[error("{provider} found no route after {attempts} attempts")]
    NoRouteFound {
        /// Provider name.
        provider: String,
        /// Provider calls made.
        attempts: usize,
    },
    /// The provider failed for reasons unrelated to the request.
    #[error("{provider} is unavailable: {source}")]
    ProviderUnavailable {
        /// Provider name.
        provider: String,
        /// Underlying failure.
        source: ProviderError,
    },
    /// A point-to-point request arrived without an end point.
    #[error("point-to-point search needs an end point")]
    MissingEndPoint,
}

/// Search `provider` for a route matching `request`.
///
/// # Errors
///
/// See [`SearchError`]. A route outside the tolerance band is not an error;
/// it is reported through [`SearchOutcome::shortfall`].
///
/// # Examples
///
/// ```
/// use runroute_core::test_support::ScriptedProvider;
/// use runroute_core::{RoutePoint, RouteRequest, SearchConfig, search_route};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ScriptedProvider::with_distances([4_200.0, 5_100.0]);
/// let request = RouteRequest::new(RoutePoint::new(59.33, 18.07)?, 5_000.0)?;
/// let outcome = search_route(&provider, &request, SearchConfig::default())?;
/// assert_eq!(outcome.result.distance_m, 5_100.0);
/// assert_eq!(outcome.attempts, 2);
/// # Ok(())
/// # }
/// ```
pub fn search_route(
    provider: &dyn RoutingProvider,
    request: &RouteRequest,
    config: SearchConfig,
) -> Result<SearchOutcome, SearchError> {
    let target = request.target_distance_m();
    let (min_m, max_m) = (provider.min_distance_m(), provider.max_distance_m());
    if !(min_m..=max_m).contains(&target) {
        return Err(SearchError::InvalidDistance {
            provider: provider.name().to_owned(),
            distance_m: target,
            min_m,
            max_m,
        });
    }

    let mut tracker = Tracker::new(provider, request);
    let outcome = match request.mode() {
        RouteMode::Loop => search_loop(&mut tracker, config)?,
        RouteMode::PointToPoint => {
            let end = request.end().ok_or(SearchError::MissingEndPoint)?;
            search_point_to_point(&mut tracker, end, config)?
        }
    };
    match outcome {
        Some(outcome) => Ok(outcome),
        None => tracker.finish(),
    }
}

fn search_loop(
    tracker: &mut Tracker<'_>,
    config: SearchConfig,
) -> Result<Option<SearchOutcome>, SearchError> {
    let request = tracker.request;
    let target = request.target_distance_m();
    let (min_m, max_m) = (tracker.provider.min_distance_m(), tracker.provider.max_distance_m());
    let mut length_m = target;
    // Variant `n` owns seeds `n * max_attempts ..`; blocks never overlap.
    let block = u64::try_from(config.max_attempts).unwrap_or(u64::MAX);
    let first = request.seed().wrapping_mul(block);
    let seeds = std::iter::successors(Some(first), |seed| Some(seed.wrapping_add(1)));

    for seed in seeds.take(config.max_attempts) {
        let query = RouteQuery::RoundTrip {
            start: request.start(),
            length_m,
            seed,
        };
        let Some(route) = tracker.attempt(&query)? else {
            continue;
        };
        let distance_m = route.distance_m;
        if request.accepts(distance_m) {
            return Ok(Some(tracker.accept(route)));
        }
        if distance_m > 0.0 {
            let scale = (target / distance_m).clamp(MIN_SCALE, MAX_SCALE);
            length_m = (length_m * scale).clamp(min_m, max_m);
        }
    }
    Ok(None)
}

fn search_point_to_point(
    tracker: &mut Tracker<'_>,
    end: RoutePoint,
    config: SearchConfig,
) -> Result<Option<SearchOutcome>, SearchError> {
    let request = tracker.request;
    let start = request.start();
    let target = request.target_distance_m();
    let (_, upper) = request.bounds();
    let straight_m = start.haversine_distance(end);
    let midpoint = start.midpoint(end);
    let heading = midpoint.bearing_to(end);

    // Ratio of road distance to straight-line distance on this network.
    let mut detour_factor = 1.0;
    let mut offset_m = None;

    for attempt in 0..config.max_attempts {
        let query = match offset_m {
            None => RouteQuery::direct(start, end),
            Some(offset) => {
                let side = if attempt % 2 == 0 { 90.0 } else { -90.0 };
                let via = midpoint.destination(heading + side, offset);
                RouteQuery::via(start, via, end)
            }
        };
        let route = tracker.attempt(&query)?;

        let Some(current) = offset_m else {
            // Direct attempt.
            if let Some(route) = route {
                let distance_m = route.distance_m;
                if request.accepts(distance_m) {
                    return Ok(Some(tracker.accept(route)));
                }
                if distance_m > upper {
                    log::debug!("direct route of {distance_m:.0} m already exceeds the target");
                    return Ok(None);
                }
                if straight_m > 0.0 {
                    detour_factor = (distance_m / straight_m).max(1.0);
                }
            }
            let offset = initial_offset(target, straight_m, detour_factor);
            if offset <= 0.0 {
                log::debug!("endpoints already {straight_m:.0} m apart; no detour can help");
                return Ok(None);
            }
            offset_m = Some(offset);
            continue;
        };

        if let Some(route) = route {
            let distance_m = route.distance_m;
            if request.accepts(distance_m) {
                return Ok(Some(tracker.accept(route)));
            }
            if distance_m > 0.0 {
                let scale = (target / distance_m).clamp(MIN_SCALE, MAX_SCALE);
                offset_m = Some(current * scale);
            }
        }
    }
    Ok(None)
}

/// Sideways offset that stretches a two-leg detour to `target_m`.
///
/// The path through a via point at offset `h` from the midpoint runs
/// `2·√((d/2)² + h²)` in a straight line, scaled by the detour factor.
fn initial_offset(target_m: f64, straight_m: f64, detour_factor: f64) -> f64 {
    let leg = target_m / (2.0 * detour_factor);
    let half = straight_m / 2.0;
    (leg * leg - half * half).max(0.0).sqrt()
}

/// Bookkeeping shared by both search modes.
struct Tracker<'a> {
    provider: &'a dyn RoutingProvider,
    request: &'a RouteRequest,
    attempts: usize,
    best: Option<RouteResult>,
}

impl<'a> Tracker<'a> {
    const fn new(provider: &'a dyn RoutingProvider, request: &'a RouteRequest) -> Self {
        Self {
            provider,
            request,
            attempts: 0,
            best: None,
        }
    }

    /// Run one query, returning `None` when the provider found no route.
    fn attempt(&mut self, query: &RouteQuery) -> Result<Option<RouteResult>, SearchError> {
        self.attempts += 1;
        match self.provider.route(query) {
            Ok(route) => {
                let distance_m = route.distance_m;
                log::debug!(
                    "attempt {} via {}: {distance_m:.0} m (target {:.0} m, deviation {:+.1} %)",
                    self.attempts,
                    self.provider.name(),
                    self.request.target_distance_m(),
                    self.request.deviation(distance_m) * 100.0,
                );
                self.remember(&route);
                Ok(Some(route))
            }
            Err(err) if err.is_request_scoped() => {
                log::debug!("attempt {} via {}: {err}", self.attempts, self.provider.name());
                Ok(None)
            }
            Err(ProviderError::LimitExceeded { .. }) => Err(SearchError::InvalidDistance {
                provider: self.provider.name().to_owned(),
                distance_m: self.request.target_distance_m(),
                min_m: self.provider.min_distance_m(),
                max_m: self.provider.max_distance_m(),
            }),
            Err(source) => Err(SearchError::ProviderUnavailable {
                provider: self.provider.name().to_owned(),
                source,
            }),
        }
    }

    fn remember(&mut self, route: &RouteResult) {
        let closer = self.best.as_ref().is_none_or(|best| {
            self.request.deviation(route.distance_m).abs()
                < self.request.deviation(best.distance_m).abs()
        });
        if closer {
            self.best = Some(route.clone());
        }
    }

    fn accept(&self, result: RouteResult) -> SearchOutcome {
        log::info!(
            "accepted {:.0} m route from {} after {} attempt(s)",
            result.distance_m,
            self.provider.name(),
            self.attempts
        );
        SearchOutcome {
            result,
            attempts: self.attempts,
            shortfall: None,
        }
    }

    /// Settle for the closest candidate, or fail when none was found.
    fn finish(self) -> Result<SearchOutcome, SearchError> {
        let Some(result) = self.best else {
            return Err(SearchError::NoRouteFound {
                provider: self.provider.name().to_owned(),
                attempts: self.attempts,
            });
        };
        let shortfall = ToleranceNotMet::check(self.request, result.distance_m);
        if let Some(notice) = &shortfall {
            log::warn!("{notice} after {} attempt(s)", self.attempts);
        }
        Ok(SearchOutcome {
            result,
            attempts: self.attempts,
            shortfall,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    use crate::test_support::{ProportionalProvider, Scripted, ScriptedProvider};

    #[fixture]
    fn start() -> RoutePoint {
        RoutePoint::new(59.3293, 18.0686).expect("valid start")
    }

    #[fixture]
    fn loop_request(start: RoutePoint) -> RouteRequest {
        RouteRequest::new(start, 5_000.0).expect("valid request")
    }

    fn round_trip_lengths(provider: &ScriptedProvider) -> Vec<f64> {
        provider
            .queries()
            .into_iter()
            .filter_map(|query| match query {
                RouteQuery::RoundTrip { length_m, .. } => Some(length_m),
                RouteQuery::Path { .. } => None,
            })
            .collect()
    }

    #[rstest]
    fn accepts_first_route_within_tolerance(loop_request: RouteRequest) {
        let provider = ScriptedProvider::with_distances([5_100.0]);
        let outcome =
            search_route(&provider, &loop_request, SearchConfig::default()).expect("route");
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.within_tolerance());
        assert_eq!(provider.calls(), 1);
    }

    #[rstest]
    fn rescales_length_from_observed_distance(loop_request: RouteRequest) {
        let provider = ScriptedProvider::with_distances([4_000.0, 5_050.0]);
        let outcome =
            search_route(&provider, &loop_request, SearchConfig::default()).expect("route");
        assert_eq!(outcome.result.distance_m, 5_050.0);
        assert_eq!(round_trip_lengths(&provider), vec![5_000.0, 6_250.0]);
    }

    #[rstest]
    fn scaling_is_clamped(loop_request: RouteRequest) {
        let provider = ScriptedProvider::with_distances([1_000.0, 5_000.0]);
        search_route(&provider, &loop_request, SearchConfig::default()).expect("route");
        assert_eq!(round_trip_lengths(&provider), vec![5_000.0, 10_000.0]);
    }

    fn round_trip_seeds(provider: &ScriptedProvider) -> Vec<u64> {
        provider
            .queries()
            .into_iter()
            .filter_map(|query| match query {
                RouteQuery::RoundTrip { seed, .. } => Some(seed),
                RouteQuery::Path { .. } => None,
            })
            .collect()
    }

    #[rstest]
    fn seed_advances_per_attempt(loop_request: RouteRequest) {
        let request = loop_request.with_seed(7);
        let provider = ScriptedProvider::with_distances([3_000.0, 3_000.0, 5_000.0]);
        search_route(&provider, &request, SearchConfig::default()).expect("route");
        assert_eq!(round_trip_seeds(&provider), vec![70, 71, 72]);
    }

    #[rstest]
    #[case(SearchConfig::default())]
    #[case(SearchConfig::with_max_attempts(3))]
    #[case(SearchConfig::with_max_attempts(25))]
    fn neighbouring_variants_share_no_seeds(
        loop_request: RouteRequest,
        #[case] config: SearchConfig,
    ) {
        let mut seen = Vec::new();
        for variant in 0..3 {
            let provider = ScriptedProvider::unroutable();
            let request = loop_request.clone().with_seed(variant);
            search_route(&provider, &request, config).expect_err("no route");
            let seeds = round_trip_seeds(&provider);
            assert_eq!(seeds.len(), config.max_attempts);
            assert!(seeds.iter().all(|seed| !seen.contains(seed)));
            seen.extend(seeds);
        }
    }

    #[rstest]
    fn returns_closest_candidate_when_budget_exhausted(loop_request: RouteRequest) {
        let provider = ScriptedProvider::with_distances([6_000.0, 4_600.0, 5_600.0]);
        let outcome = search_route(
            &provider,
            &loop_request,
            SearchConfig::with_max_attempts(3),
        )
        .expect("best effort");
        assert_eq!(outcome.result.distance_m, 4_600.0);
        assert_eq!(outcome.attempts, 3);
        let notice = outcome.shortfall.expect("tolerance missed");
        assert_eq!(notice.distance_m, 4_600.0);
        assert_eq!(notice.target_m, 5_000.0);
    }

    #[rstest]
    fn skips_attempts_without_route(loop_request: RouteRequest) {
        let provider = ScriptedProvider::new([
            Scripted::Error(ProviderError::NoRoute {
                message: "island".into(),
            }),
            Scripted::Distance(4_900.0),
        ]);
        let outcome =
            search_route(&provider, &loop_request, SearchConfig::default()).expect("route");
        assert_eq!(outcome.attempts, 2);
        assert!(outcome.within_tolerance());
    }

    #[rstest]
    fn reports_no_route_when_every_attempt_fails(loop_request: RouteRequest) {
        let provider = ScriptedProvider::unroutable();
        let err = search_route(&provider, &loop_request, SearchConfig::with_max_attempts(4))
            .expect_err("no route");
        assert_eq!(
            err,
            SearchError::NoRouteFound {
                provider: "scripted".into(),
                attempts: 4
            }
        );
    }

    #[rstest]
    fn transport_failure_aborts(loop_request: RouteRequest) {
        let provider = ScriptedProvider::new([Scripted::Error(ProviderError::Unauthorized {
            url: "https://example.test".into(),
            status: 403,
        })]);
        let err = search_route(&provider, &loop_request, SearchConfig::default())
            .expect_err("unavailable");
        assert!(matches!(err, SearchError::ProviderUnavailable { .. }));
        assert_eq!(provider.calls(), 1);
    }

    #[rstest]
    fn limit_exceeded_is_an_invalid_distance(loop_request: RouteRequest) {
        let provider = ScriptedProvider::new([Scripted::Error(ProviderError::LimitExceeded {
            message: "too long".into(),
        })]);
        let err = search_route(&provider, &loop_request, SearchConfig::default())
            .expect_err("limit");
        assert!(matches!(err, SearchError::InvalidDistance { .. }));
    }

    #[rstest]
    fn direct_route_within_tolerance_is_accepted(start: RoutePoint) {
        let end = start.destination(90.0, 4_000.0);
        let request = RouteRequest::point_to_point(start, end, 5_000.0).expect("valid");
        let provider = ScriptedProvider::with_distances([5_000.0]);
        let outcome = search_route(&provider, &request, SearchConfig::default()).expect("route");
        assert_eq!(outcome.attempts, 1);
        assert_eq!(
            provider.queries(),
            vec![RouteQuery::direct(start, end)]
        );
    }

    #[rstest]
    fn too_long_direct_route_stops_immediately(start: RoutePoint) {
        let end = start.destination(90.0, 8_000.0);
        let request = RouteRequest::point_to_point(start, end, 5_000.0).expect("valid");
        let provider = ScriptedProvider::with_distances([9_000.0]);
        let outcome = search_route(&provider, &request, SearchConfig::default()).expect("route");
        assert_eq!(provider.calls(), 1);
        assert!(outcome.shortfall.is_some());
    }

    #[rstest]
    fn short_direct_route_detours_on_alternating_sides(start: RoutePoint) {
        let end = start.destination(90.0, 2_000.0);
        let request = RouteRequest::point_to_point(start, end, 5_000.0).expect("valid");
        let provider = ScriptedProvider::with_distances([2_400.0, 3_800.0, 5_100.0]);
        let outcome = search_route(&provider, &request, SearchConfig::default()).expect("route");
        assert_eq!(outcome.result.distance_m, 5_100.0);

        let vias: Vec<RoutePoint> = provider
            .queries()
            .into_iter()
            .filter_map(|query| match query {
                RouteQuery::Path { waypoints } if waypoints.len() == 3 => Some(waypoints[1]),
                _ => None,
            })
            .collect();
        assert_eq!(vias.len(), 2);
        // Heading east, so the two detours fall on opposite sides of the
        // start latitude.
        assert!((vias[0].lat - start.lat) * (vias[1].lat - start.lat) < 0.0);
    }

    #[rstest]
    fn failed_direct_route_between_distant_endpoints_stops(start: RoutePoint) {
        let end = start.destination(90.0, 6_000.0);
        let request = RouteRequest::point_to_point(start, end, 5_000.0).expect("valid");
        let provider = ScriptedProvider::new([
            Scripted::Error(ProviderError::NoRoute {
                message: "closed road".into(),
            }),
            Scripted::Distance(6_500.0),
        ]);
        let err = search_route(&provider, &request, SearchConfig::default())
            .expect_err("no route");
        assert_eq!(
            err,
            SearchError::NoRouteFound {
                provider: "scripted".into(),
                attempts: 1
            }
        );
        assert_eq!(provider.calls(), 1);
    }

    #[rstest]
    fn proportional_provider_converges(start: RoutePoint) {
        let provider = ProportionalProvider::new(1.3);
        let request = RouteRequest::new(start, 8_000.0).expect("valid");
        let outcome = search_route(&provider, &request, SearchConfig::default()).expect("route");
        assert!(outcome.within_tolerance());
        assert_eq!(provider.calls(), 2);
    }

    #[rstest]
    fn rejects_targets_outside_provider_range(start: RoutePoint) {
        struct ShortRange;
        impl RoutingProvider for ShortRange {
            fn name(&self) -> &str {
                "short"
            }
            fn max_distance_m(&self) -> f64 {
                2_000.0
            }
            fn route(&self, _query: &RouteQuery) -> Result<RouteResult, ProviderError> {
                Err(ProviderError::NoRoute {
                    message: "unused".into(),
                })
            }
        }
        let request = RouteRequest::new(start, 5_000.0).expect("valid");
        let err = search_route(&ShortRange, &request, SearchConfig::default())
            .expect_err("out of range");
        assert!(matches!(err, SearchError::InvalidDistance { max_m, .. } if max_m == 2_000.0));
    }
}

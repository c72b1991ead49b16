//! Cache-aware planning across one or more routing providers.
//!
//! [`RoutePlanner::plan`] is the single entry point front ends call: it
//! fingerprints the request, answers from the cache when it can, otherwise
//! runs the distance-tolerance search against every configured provider and
//! keeps the best outcome, then derives statistics at the request's pace.

use std::cmp::Ordering;

use crate::{
    MemoryRouteCache, PlanError, RequestFingerprint, RouteCache, RouteRequest, RouteResult,
    RouteStats, RoutingProvider, SearchConfig, SearchOutcome, ToleranceNotMet, route_stats,
    search_route,
};

/// A planned route with its statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    /// The chosen route.
    pub result: RouteResult,
    /// Duration and elevation summary at the request's pace.
    pub stats: RouteStats,
    /// Provider calls made; zero for a cache hit.
    pub attempts: usize,
    /// Whether the route came from the cache.
    pub from_cache: bool,
    /// Present when the route is outside the tolerance band.
    pub shortfall: Option<ToleranceNotMet>,
}

/// Plans routes and remembers them for the lifetime of the planner.
///
/// # Examples
///
/// ```
/// use runroute_core::test_support::ScriptedProvider;
/// use runroute_core::{RoutePlanner, RoutePoint, RouteRequest};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut planner = RoutePlanner::new(Box::new(ScriptedProvider::with_distances([5_100.0])));
/// let request = RouteRequest::new(RoutePoint::new(59.33, 18.07)?, 5_000.0)?;
///
/// let first = planner.plan(&request)?;
/// let again = planner.plan(&request)?;
/// assert!(!first.from_cache);
/// assert!(again.from_cache);
/// assert_eq!(again.attempts, 0);
/// # Ok(())
/// # }
/// ```
pub struct RoutePlanner<C = MemoryRouteCache> {
    providers: Vec<Box<dyn RoutingProvider>>,
    cache: C,
    config: SearchConfig,
}

impl RoutePlanner<MemoryRouteCache> {
    /// Plan with a single provider and an empty in-memory cache.
    #[must_use]
    pub fn new(provider: Box<dyn RoutingProvider>) -> Self {
        Self::with_cache(vec![provider], MemoryRouteCache::new())
    }
}

impl<C: RouteCache> RoutePlanner<C> {
    /// Plan with every provider in `providers`, storing routes in `cache`.
    #[must_use]
    pub fn with_cache(providers: Vec<Box<dyn RoutingProvider>>, cache: C) -> Self {
        Self {
            providers,
            cache,
            config: SearchConfig::default(),
        }
    }

    /// Add another provider to consult on cache misses.
    #[must_use]
    pub fn with_provider(mut self, provider: Box<dyn RoutingProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Replace the search tuning.
    #[must_use]
    pub fn with_search_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Stored routes.
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// Plan a route for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::NoProvider`] when no provider is configured, the
    /// first provider's [`crate::SearchError`] when every provider fails, and
    /// [`PlanError::InvalidProfile`] when the route's elevation samples are
    /// unusable.
    pub fn plan(&mut self, request: &RouteRequest) -> Result<PlannedRoute, PlanError> {
        if self.providers.is_empty() {
            return Err(PlanError::NoProvider);
        }
        let names: Vec<&str> = self.providers.iter().map(|provider| provider.name()).collect();
        let key = RequestFingerprint::new(request, &names);

        if let Some(result) = self.cache.get(&key) {
            log::debug!("cache hit for {} m {} route", request.target_distance_m(), request.mode());
            let shortfall = ToleranceNotMet::check(request, result.distance_m);
            return finish(request, result, 0, true, shortfall);
        }

        let outcome = self.search_all(request)?;
        self.cache.put(key, outcome.result.clone());
        finish(
            request,
            outcome.result,
            outcome.attempts,
            false,
            outcome.shortfall,
        )
    }

    fn search_all(&self, request: &RouteRequest) -> Result<SearchOutcome, PlanError> {
        let mut best: Option<SearchOutcome> = None;
        let mut first_error = None;
        let mut attempts = 0;

        for provider in &self.providers {
            match search_route(provider.as_ref(), request, self.config) {
                Ok(outcome) => {
                    attempts += outcome.attempts;
                    let better = best
                        .as_ref()
                        .is_none_or(|current| rank(request, &outcome, current).is_lt());
                    if better {
                        best = Some(outcome);
                    }
                }
                Err(err) => {
                    log::warn!("{err}");
                    first_error.get_or_insert(err);
                }
            }
        }

        match (best, first_error) {
            (Some(outcome), _) => Ok(SearchOutcome { attempts, ..outcome }),
            (None, Some(err)) => Err(err.into()),
            (None, None) => Err(PlanError::NoProvider),
        }
    }
}

/// Routes within tolerance first, then by smallest deviation.
fn rank(request: &RouteRequest, a: &SearchOutcome, b: &SearchOutcome) -> Ordering {
    let deviation = |outcome: &SearchOutcome| request.deviation(outcome.result.distance_m).abs();
    a.shortfall
        .is_some()
        .cmp(&b.shortfall.is_some())
        .then_with(|| deviation(a).total_cmp(&deviation(b)))
}

fn finish(
    request: &RouteRequest,
    result: RouteResult,
    attempts: usize,
    from_cache: bool,
    shortfall: Option<ToleranceNotMet>,
) -> Result<PlannedRoute, PlanError> {
    let profile: Vec<f64> = result.elevation_profile().collect();
    let mut stats = route_stats(result.distance_m, &profile, request.pace())?;
    if profile.is_empty() {
        stats.elevation_gain_m = result.elevation_gain_m;
    }
    Ok(PlannedRoute {
        result,
        stats,
        attempts,
        from_cache,
        shortfall,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    use crate::test_support::{Scripted, ScriptedProvider};
    use crate::{Pace, ProviderError, RoutePoint, SearchError};

    #[fixture]
    fn request() -> RouteRequest {
        let start = RoutePoint::new(59.3293, 18.0686).expect("valid start");
        RouteRequest::new(start, 5_000.0).expect("valid request")
    }

    #[rstest]
    fn computes_stats_at_request_pace(request: RouteRequest) {
        let mut planner = RoutePlanner::new(Box::new(ScriptedProvider::with_distances([4_950.0])));
        let planned = planner.plan(&request).expect("route");
        assert_eq!(planned.stats.duration.as_secs(), 1_633);
        assert_eq!(planned.attempts, 1);
        assert!(planned.shortfall.is_none());
    }

    #[rstest]
    fn cache_hit_recomputes_stats_for_new_pace(request: RouteRequest) {
        let mut planner = RoutePlanner::new(Box::new(ScriptedProvider::with_distances([5_000.0])));
        planner.plan(&request).expect("route");

        let faster = request.with_pace(Pace::from_seconds_per_km(240).expect("non-zero"));
        let planned = planner.plan(&faster).expect("cached route");
        assert!(planned.from_cache);
        assert_eq!(planned.stats.duration.as_secs(), 1_200);
        assert_eq!(planner.cache().len(), 1);
    }

    #[rstest]
    fn prefers_routes_within_tolerance(request: RouteRequest) {
        let mut planner = RoutePlanner::new(Box::new(
            ScriptedProvider::with_distances([5_400.0]).named("first"),
        ))
        .with_provider(Box::new(
            ScriptedProvider::with_distances([4_900.0]).named("second"),
        ))
        .with_search_config(SearchConfig::with_max_attempts(1));
        let planned = planner.plan(&request).expect("route");
        assert_eq!(planned.result.provider, "second");
        assert_eq!(planned.attempts, 2);
    }

    #[rstest]
    fn falls_back_to_closest_deviation(request: RouteRequest) {
        let mut planner = RoutePlanner::new(Box::new(
            ScriptedProvider::with_distances([6_500.0]).named("far"),
        ))
        .with_provider(Box::new(
            ScriptedProvider::with_distances([4_400.0]).named("near"),
        ))
        .with_search_config(SearchConfig::with_max_attempts(1));
        let planned = planner.plan(&request).expect("best effort");
        assert_eq!(planned.result.provider, "near");
        assert!(planned.shortfall.is_some());
    }

    #[rstest]
    fn survives_one_unavailable_provider(request: RouteRequest) {
        let mut planner = RoutePlanner::new(Box::new(ScriptedProvider::new([Scripted::Error(
            ProviderError::NetworkError {
                url: "https://example.test".into(),
                message: "refused".into(),
            },
        )])))
        .with_provider(Box::new(ScriptedProvider::with_distances([5_000.0]).named("ok")));
        let planned = planner.plan(&request).expect("second provider answers");
        assert_eq!(planned.result.provider, "ok");
    }

    #[rstest]
    fn reports_no_route(request: RouteRequest) {
        let mut planner = RoutePlanner::new(Box::new(ScriptedProvider::unroutable()));
        let err = planner.plan(&request).expect_err("unreachable");
        assert!(matches!(
            err,
            PlanError::Search(SearchError::NoRouteFound { .. })
        ));
        assert!(planner.cache().is_empty());
    }

    #[rstest]
    fn requires_a_provider(request: RouteRequest) {
        let mut planner = RoutePlanner::with_cache(Vec::new(), MemoryRouteCache::new());
        assert_eq!(planner.plan(&request), Err(PlanError::NoProvider));
    }
}

//! Deterministic routing providers and geocoders for unit and behaviour
//! tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use crate::{
    GeocodeError, Geocoder, Place, ProviderError, RoutePoint, RouteQuery, RouteResult,
    RoutingProvider,
};

/// Canned answer returned by [`ScriptedProvider`].
#[derive(Debug, Clone, PartialEq)]
pub enum Scripted {
    /// A route of this many metres.
    Distance(f64),
    /// This error.
    Error(ProviderError),
}

/// `RoutingProvider` replaying a fixed script of answers.
///
/// Each call consumes the next answer; once the script runs out the last
/// answer repeats. Every query is recorded for later inspection.
#[derive(Debug)]
pub struct ScriptedProvider {
    name: String,
    script: RefCell<VecDeque<Scripted>>,
    last: RefCell<Option<Scripted>>,
    queries: RefCell<Vec<RouteQuery>>,
}

impl ScriptedProvider {
    /// Replay the supplied answers.
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Scripted>,
    {
        Self {
            name: "scripted".to_owned(),
            script: RefCell::new(script.into_iter().collect()),
            last: RefCell::new(None),
            queries: RefCell::new(Vec::new()),
        }
    }

    /// Answer with routes of the given distances in turn.
    pub fn with_distances<I>(distances: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self::new(distances.into_iter().map(Scripted::Distance))
    }

    /// Answer every call with `NoRoute`.
    pub fn unroutable() -> Self {
        Self::new([Scripted::Error(ProviderError::NoRoute {
            message: "unreachable".to_owned(),
        })])
    }

    /// Replace the reported provider name.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        name.clone_into(&mut self.name);
        self
    }

    /// Number of routing calls made so far.
    pub fn calls(&self) -> usize {
        self.queries.borrow().len()
    }

    /// Queries received, in call order.
    pub fn queries(&self) -> Vec<RouteQuery> {
        self.queries.borrow().clone()
    }

    fn next_answer(&self) -> Option<Scripted> {
        let next = self.script.borrow_mut().pop_front();
        match next {
            Some(answer) => {
                *self.last.borrow_mut() = Some(answer.clone());
                Some(answer)
            }
            None => self.last.borrow().clone(),
        }
    }
}

impl RoutingProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn route(&self, query: &RouteQuery) -> Result<RouteResult, ProviderError> {
        self.queries.borrow_mut().push(query.clone());
        match self.next_answer() {
            Some(Scripted::Distance(distance_m)) => {
                Ok(RouteResult::new(geometry(query), distance_m, None, self.name()))
            }
            Some(Scripted::Error(err)) => Err(err),
            None => Err(ProviderError::NoRoute {
                message: "empty script".to_owned(),
            }),
        }
    }
}

/// `RoutingProvider` whose answers are a fixed multiple of the request.
///
/// Round trips come back `factor × length`; paths come back `factor ×`
/// their straight-line length. Useful for exercising the search on
/// reachable targets.
#[derive(Debug)]
pub struct ProportionalProvider {
    factor: f64,
    calls: Cell<usize>,
}

impl ProportionalProvider {
    /// Scale every answer by `factor`.
    pub const fn new(factor: f64) -> Self {
        Self {
            factor,
            calls: Cell::new(0),
        }
    }

    /// Number of routing calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl RoutingProvider for ProportionalProvider {
    fn name(&self) -> &str {
        "proportional"
    }

    fn route(&self, query: &RouteQuery) -> Result<RouteResult, ProviderError> {
        self.calls.set(self.calls.get() + 1);
        let distance_m = match query {
            RouteQuery::RoundTrip { length_m, .. } => length_m * self.factor,
            RouteQuery::Path { waypoints } => crate::path_length(waypoints) * self.factor,
        };
        Ok(RouteResult::new(geometry(query), distance_m, None, self.name()))
    }
}

/// A small triangle for round trips, the waypoints themselves for paths.
fn geometry(query: &RouteQuery) -> Vec<RoutePoint> {
    match query {
        RouteQuery::RoundTrip {
            start, length_m, ..
        } => {
            let leg = length_m / 3.0;
            let first = start.destination(0.0, leg).with_elevation(Some(12.0));
            let second = start.destination(60.0, leg).with_elevation(Some(8.0));
            vec![start.with_elevation(Some(10.0)), first, second, start.with_elevation(Some(10.0))]
        }
        RouteQuery::Path { waypoints } => waypoints.clone(),
    }
}

/// `Geocoder` answering every lookup with the same place or failing.
#[derive(Debug)]
pub struct StubGeocoder {
    place: Option<Place>,
    calls: Cell<usize>,
}

impl StubGeocoder {
    /// Resolve every query to `point`.
    pub fn resolving_to(point: RoutePoint) -> Self {
        Self {
            place: Some(Place {
                point,
                label: "Stub Place".to_owned(),
            }),
            calls: Cell::new(0),
        }
    }

    /// Report `NotFound` for every query.
    pub const fn failing() -> Self {
        Self {
            place: None,
            calls: Cell::new(0),
        }
    }

    /// Number of lookups made so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Geocoder for StubGeocoder {
    fn geocode(&self, query: &str) -> Result<Place, GeocodeError> {
        self.calls.set(self.calls.get() + 1);
        self.place.clone().ok_or_else(|| GeocodeError::NotFound {
            query: query.to_owned(),
        })
    }

    fn reverse(&self, point: RoutePoint) -> Result<Place, GeocodeError> {
        self.calls.set(self.calls.get() + 1);
        self.place
            .as_ref()
            .map(|place| Place {
                point,
                label: place.label.clone(),
            })
            .ok_or_else(|| GeocodeError::NotFound {
                query: point.to_string(),
            })
    }
}

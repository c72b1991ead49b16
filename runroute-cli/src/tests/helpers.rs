//! Stub backends standing in for the HTTP services.

use std::cell::Cell;

use runroute_core::test_support::{ScriptedProvider, StubGeocoder};
use runroute_core::{Geocoder, RoutePoint, RoutingProvider};

use super::*;
use crate::geocode::{GeocodeBackend, GeocodeConfig};
use crate::plan::{PlanBackend, PlanConfig};

/// Where stub geocoders place every address.
pub(super) fn stub_place() -> RoutePoint {
    RoutePoint::new(59.3326, 18.0649).expect("valid point")
}

/// How the stub routing provider answers.
#[derive(Debug, Clone)]
pub(super) enum ProviderScript {
    Distances(Vec<f64>),
    Unroutable,
}

/// `PlanBackend` built from stub providers and geocoders.
#[derive(Debug)]
pub(super) struct StubPlanBackend {
    script: ProviderScript,
    geocoder_builds: Cell<usize>,
}

impl StubPlanBackend {
    pub(super) fn with_distances<I>(distances: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self {
            script: ProviderScript::Distances(distances.into_iter().collect()),
            geocoder_builds: Cell::new(0),
        }
    }

    pub(super) fn unroutable() -> Self {
        Self {
            script: ProviderScript::Unroutable,
            geocoder_builds: Cell::new(0),
        }
    }

    pub(super) fn geocoder_builds(&self) -> usize {
        self.geocoder_builds.get()
    }
}

impl PlanBackend for StubPlanBackend {
    fn geocoder(&self, _config: &PlanConfig) -> Result<Box<dyn Geocoder>, CliError> {
        self.geocoder_builds.set(self.geocoder_builds.get() + 1);
        Ok(Box::new(StubGeocoder::resolving_to(stub_place())))
    }

    fn providers(&self, _config: &PlanConfig) -> Result<Vec<Box<dyn RoutingProvider>>, CliError> {
        let provider = match &self.script {
            ProviderScript::Distances(distances) => {
                ScriptedProvider::with_distances(distances.iter().copied())
            }
            ProviderScript::Unroutable => ScriptedProvider::unroutable(),
        };
        Ok(vec![Box::new(provider.named("stub"))])
    }
}

/// `GeocodeBackend` answering from a [`StubGeocoder`].
#[derive(Debug)]
pub(super) struct StubGeocodeBackend {
    pub(super) resolves: bool,
}

impl GeocodeBackend for StubGeocodeBackend {
    fn geocoder(&self, _config: &GeocodeConfig) -> Result<Box<dyn Geocoder>, CliError> {
        let geocoder = if self.resolves {
            StubGeocoder::resolving_to(stub_place())
        } else {
            StubGeocoder::failing()
        };
        Ok(Box::new(geocoder))
    }
}

//! Resolve free-text addresses to coordinates and back.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ProviderError, RoutePoint};

/// A geocoded location with its display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Resolved coordinates.
    pub point: RoutePoint,
    /// Human-readable label reported by the geocoder.
    pub label: String,
}

/// Errors from [`Geocoder`] implementations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    /// The query was empty after trimming.
    #[error("address must not be empty")]
    EmptyQuery,
    /// The service returned no candidates.
    #[error("no location found for {query:?}")]
    NotFound {
        /// The query as submitted.
        query: String,
    },
    /// The service returned coordinates outside the valid range.
    #[error("geocoder returned invalid coordinates: {0}")]
    InvalidCoordinates(#[from] crate::PointError),
    /// The service could not be reached or rejected the request.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Forward and reverse geocoding.
pub trait Geocoder {
    /// Resolve `query` to the best matching place.
    fn geocode(&self, query: &str) -> Result<Place, GeocodeError>;

    /// Describe the place nearest to `point`.
    fn reverse(&self, point: RoutePoint) -> Result<Place, GeocodeError>;
}

impl<G: Geocoder + ?Sized> Geocoder for Box<G> {
    fn geocode(&self, query: &str) -> Result<Place, GeocodeError> {
        (**self).geocode(query)
    }

    fn reverse(&self, point: RoutePoint) -> Result<Place, GeocodeError> {
        (**self).reverse(point)
    }
}

/// A location given either as coordinates or as an address to geocode.
///
/// # Examples
///
/// ```
/// use runroute_core::LocationInput;
///
/// assert!(matches!(LocationInput::parse("59.33,18.07"), LocationInput::Coordinates(_)));
/// assert!(matches!(LocationInput::parse("Stureplan, Stockholm"), LocationInput::Address(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// A `lat,lon` pair.
    Coordinates(RoutePoint),
    /// Free text for the geocoder.
    Address(String),
}

impl LocationInput {
    /// Interpret `input` as coordinates when it parses as a valid pair.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        input.parse::<RoutePoint>().map_or_else(
            |_| Self::Address(input.trim().to_owned()),
            Self::Coordinates,
        )
    }

    /// Resolve to a point, consulting `geocoder` for addresses only.
    pub fn resolve(&self, geocoder: &dyn Geocoder) -> Result<RoutePoint, GeocodeError> {
        match self {
            Self::Coordinates(point) => Ok(*point),
            Self::Address(address) if address.is_empty() => Err(GeocodeError::EmptyQuery),
            Self::Address(address) => {
                let place = geocoder.geocode(address)?;
                log::debug!("resolved {address:?} to {} ({})", place.point, place.label);
                Ok(place.point)
            }
        }
    }
}

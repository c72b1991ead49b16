//! HTTP geocoders.
//!
//! Both adapters implement [`runroute_core::Geocoder`]: forward lookups keep
//! the best candidate only, and reverse lookups report the service's label for
//! the nearest place.

mod nominatim;
mod openrouteservice;

pub use nominatim::{
    DEFAULT_MIN_INTERVAL, DEFAULT_NOMINATIM_BASE_URL, NominatimConfig, NominatimGeocoder,
};
pub use openrouteservice::OrsGeocoder;

//! External services and file formats for runroute.
//!
//! Responsibilities:
//! - Implement the routing and geocoding traits from `runroute-core` over
//!   HTTP (OpenRouteService, GraphHopper, Nominatim).
//! - Export planned routes as GPX 1.1 and read GPX tracks back.
//!
//! Boundaries:
//! - No search or ranking logic; that lives in `runroute-core`.
//! - Adapters block on an internal Tokio runtime so callers stay synchronous.
//!
//! Invariants:
//! - API keys never appear in logs or error messages.
//! - No global mutable state.

pub mod export;
pub mod geocoding;
mod http;
pub mod routing;

pub use http::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ProviderBuildError};

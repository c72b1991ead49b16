//! Fetch routes from an external routing service.
//!
//! The `RoutingProvider` trait abstracts a single routing call: callers
//! describe either a round trip of a requested length or a path through a
//! sequence of waypoints, and receive a [`RouteResult`](crate::RouteResult).
//!
//! Errors separate "the service answered but found no route" from transport
//! and authentication failures so the search can decide whether to retry.

mod error;
mod provider;

pub use error::ProviderError;
pub use provider::{RouteQuery, RoutingProvider};

use thiserror::Error;

/// Errors from [`crate::routing::RoutingProvider::route`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The service could not find a route for the supplied points.
    ///
    /// Typically an unroutable point (water, private land) or an unreachable
    /// pair. The search skips the attempt and tries the next variant.
    #[error("no route found: {message}")]
    NoRoute {
        /// Message reported by the service.
        message: String,
    },
    /// The request exceeded a service limit such as the maximum loop length.
    #[error("request exceeds service limits: {message}")]
    LimitExceeded {
        /// Message reported by the service.
        message: String,
    },
    /// The service rejected the API key.
    #[error("{url} rejected the credentials (HTTP {status})")]
    Unauthorized {
        /// Request URL without query parameters.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL without query parameters.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The service returned a non-success HTTP status.
    #[error("{url} returned HTTP {status}: {message}")]
    HttpError {
        /// Request URL without query parameters.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },
    /// The connection failed before a response was received.
    #[error("network error contacting {url}: {message}")]
    NetworkError {
        /// Request URL without query parameters.
        url: String,
        /// Underlying error text.
        message: String,
    },
    /// The service answered with an application-level error code.
    #[error("service error {code}: {message}")]
    ServiceError {
        /// Service-specific error code.
        code: String,
        /// Message reported by the service.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to parse service response: {message}")]
    ParseError {
        /// Decoder error text.
        message: String,
    },
}

impl ProviderError {
    /// Whether the failure concerns this particular request rather than the
    /// service as a whole.
    ///
    /// Request-scoped failures are worth retrying with a different variant;
    /// everything else means the provider is unavailable.
    #[must_use]
    pub const fn is_request_scoped(&self) -> bool {
        matches!(self, Self::NoRoute { .. })
    }
}

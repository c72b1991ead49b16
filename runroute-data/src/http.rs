//! Blocking bridge from the synchronous provider traits to `reqwest`.
//!
//! Every HTTP adapter owns an [`HttpBridge`]: a `reqwest` client plus a
//! current-thread Tokio runtime reused across calls. When a call arrives from
//! inside a multi-threaded Tokio runtime the bridge borrows that runtime via
//! [`tokio::task::block_in_place`] instead, avoiding nested-runtime panics.
//! Inside a `current_thread` runtime it falls back to its own runtime, which
//! may stall the caller's runtime while the request is in flight.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use runroute_core::ProviderError;
use serde::de::DeserializeOwned;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

/// Default user agent for outgoing requests.
pub const DEFAULT_USER_AGENT: &str = concat!("runroute/", env!("CARGO_PKG_VERSION"));

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for adapter construction failures.
#[derive(Debug)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    HttpClient(reqwest::Error),
    /// Failed to build the Tokio runtime.
    Runtime(std::io::Error),
    /// The configured base URL does not parse.
    BaseUrl(url::ParseError),
    /// The named service requires an API key and none was configured.
    MissingApiKey(&'static str),
}

impl std::fmt::Display for ProviderBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpClient(err) => write!(f, "failed to build HTTP client: {err}"),
            Self::Runtime(err) => write!(f, "failed to build Tokio runtime: {err}"),
            Self::BaseUrl(err) => write!(f, "invalid base URL: {err}"),
            Self::MissingApiKey(service) => write!(f, "no API key configured for {service}"),
        }
    }
}

impl std::error::Error for ProviderBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HttpClient(err) => Some(err),
            Self::Runtime(err) => Some(err),
            Self::BaseUrl(err) => Some(err),
            Self::MissingApiKey(_) => None,
        }
    }
}

/// A completed HTTP exchange.
#[derive(Debug)]
pub(crate) struct Reply {
    pub status: StatusCode,
    pub body: String,
    /// Request URL without query parameters, safe to log.
    pub url: String,
}

impl Reply {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ProviderError> {
        serde_json::from_str(&self.body).map_err(|err| ProviderError::ParseError {
            message: err.to_string(),
        })
    }

    /// Map authentication failures shared by every service.
    pub fn check_credentials(&self) -> Result<(), ProviderError> {
        if matches!(self.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ProviderError::Unauthorized {
                url: self.url.clone(),
                status: self.status.as_u16(),
            });
        }
        Ok(())
    }

    /// Generic error for a non-success status.
    pub fn http_error(&self) -> ProviderError {
        ProviderError::HttpError {
            url: self.url.clone(),
            status: self.status.as_u16(),
            message: self.body.chars().take(200).collect(),
        }
    }
}

/// Reject blank API keys before any request is attempted.
pub(crate) fn require_key(api_key: &str, service: &'static str) -> Result<(), ProviderBuildError> {
    if api_key.trim().is_empty() {
        return Err(ProviderBuildError::MissingApiKey(service));
    }
    Ok(())
}

/// Parse a configured base URL.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, ProviderBuildError> {
    Url::parse(base_url.trim_end_matches('/')).map_err(ProviderBuildError::BaseUrl)
}

/// Append `path` to the path of `base`.
pub(crate) fn endpoint(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    url
}

/// `url` with its query removed, for logs and error messages.
pub(crate) fn redacted(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}

/// HTTP client and runtime shared by one adapter.
pub(crate) struct HttpBridge {
    client: Client,
    runtime: Runtime,
    timeout: Duration,
}

impl std::fmt::Debug for HttpBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBridge")
            .field("client", &self.client)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpBridge {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ProviderBuildError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self {
            client,
            runtime,
            timeout,
        })
    }

    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Send `request` and collect the status and body.
    ///
    /// Non-success statuses are returned as a [`Reply`] so each adapter can
    /// interpret the service's error payload.
    pub fn execute(&self, request: RequestBuilder, url: &Url) -> Result<Reply, ProviderError> {
        let url = redacted(url);
        log::debug!("requesting {url}");
        let future = async {
            let response = request
                .send()
                .await
                .map_err(|err| self.convert_reqwest_error(err, &url))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|err| self.convert_reqwest_error(err, &url))?;
            Ok::<_, ProviderError>(Reply {
                status,
                body,
                url: url.clone(),
            })
        };
        self.block_on(future)
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }

    /// The URL is dropped from `error` because its query may carry an API key.
    fn convert_reqwest_error(&self, error: reqwest::Error, url: &str) -> ProviderError {
        let error = error.without_url();
        if error.is_timeout() {
            return ProviderError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return ProviderError::HttpError {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        ProviderError::NetworkError {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

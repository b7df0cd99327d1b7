//! Error type for API calls.
//!
//! Exactly one error type crosses the client boundary. Every variant can be asked
//! for its HTTP status code and its parsed error body, so callers can branch on
//! [`Error::status_code`] without inspecting the variant or re-parsing anything.
//! A `None` status always means no response was received.

use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;

/// The error type for every client-facing failure.
///
/// # Examples
///
/// ```no_run
/// use booker_client::{ApiClient, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = ApiClient::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// match client.get("/booking/1").await {
///     Ok(response) => println!("Found: {}", response.text()),
///     Err(err) if err.status_code() == Some(404) => {
///         println!("Missing booking, body: {:?}", err.payload());
///     }
///     Err(err) if err.is_network_failure() => eprintln!("No response: {}", err),
///     Err(err) => eprintln!("Other error: {}", err),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No response was received: DNS failure, refused connection, reset, etc.
    ///
    /// Raised only after the retry policy gave up.
    #[error("Network error during {method} {url} after {attempts} attempt(s): {source}")]
    Network {
        /// The request method
        method: Method,
        /// The resolved request URL
        url: String,
        /// How many attempts were made
        attempts: usize,
        /// The underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// The connect or read timeout elapsed on the last attempt.
    #[error("Request timed out during {method} {url} after {attempts} attempt(s)")]
    Timeout {
        /// The request method
        method: Method,
        /// The resolved request URL
        url: String,
        /// How many attempts were made
        attempts: usize,
        /// The underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a 4xx or 5xx status.
    ///
    /// `payload` holds the body parsed as JSON when that succeeded. A malformed
    /// body leaves it `None` and never hides the status.
    #[error("HTTP error {status} for {method} {url}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The request method
        method: Method,
        /// The resolved request URL
        url: String,
        /// The raw response body
        raw_response: String,
        /// The response body parsed as JSON, if it was valid JSON
        payload: Option<Value>,
        /// The response headers
        headers: HeaderMap,
    },

    /// A successful body could not be decoded into the requested type.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// A payload could not be normalized into a JSON object.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// The client or request was configured incorrectly.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The base URL or an endpoint could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns the HTTP status code, or `None` when no response was received.
    ///
    /// A status alone does not mean the server reported a failure:
    /// [`Error::DeserializationFailed`] carries the status of a response that
    /// arrived fine but could not be decoded, usually a 2xx. Restful-Booker, for
    /// one, rejects bad credentials with `200 {"reason": "Bad credentials"}`.
    /// Match on [`Error::HttpError`] to select error statuses only.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the HTTP status code as a plain integer. See [`status`](Self::status)
    /// for which variants carry one.
    pub fn status_code(&self) -> Option<u16> {
        self.status().map(|status| status.as_u16())
    }

    /// Returns the parsed error body of an HTTP error response.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Error::HttpError { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Human-readable message, identical to the `Display` output.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns `true` if the request never produced a response.
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Error::Network { .. } | Error::Timeout { .. })
    }

    /// Returns `true` if the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Number of attempts the transport made before the network failure.
    pub fn attempts(&self) -> Option<usize> {
        match self {
            Error::Network { attempts, .. } | Error::Timeout { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Wraps a transport failure, keeping timeouts distinct from other network errors.
    pub(crate) fn from_transport(
        source: reqwest::Error,
        method: Method,
        url: impl Into<String>,
        attempts: usize,
    ) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Error::Timeout {
                method,
                url,
                attempts,
                source,
            }
        } else {
            Error::Network {
                method,
                url,
                attempts,
                source,
            }
        }
    }

    /// Builds an HTTP error from a received error response.
    ///
    /// The body is parsed as JSON on a best-effort basis.
    pub(crate) fn from_response(
        status: StatusCode,
        method: Method,
        url: impl Into<String>,
        raw_response: String,
        headers: HeaderMap,
    ) -> Self {
        let payload = serde_json::from_str::<Value>(&raw_response).ok();
        Error::HttpError {
            status,
            method,
            url: url.into(),
            raw_response,
            payload,
            headers,
        }
    }
}

/// A specialized `Result` type for API calls.
pub type Result<T> = std::result::Result<T, Error>;

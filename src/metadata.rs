//! Per-call request options and the resolved request envelope.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::{Map, Value};
use url::Url;

/// Per-call options for a single API request.
///
/// `endpoint` is resolved against the client's base URL. It may be an absolute
/// path (`/booking/1`) or a relative one (`booking/1`).
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// The HTTP method (GET, POST, etc.).
    pub method: Method,

    /// The endpoint, relative to the base URL.
    pub endpoint: String,

    /// Additional headers for this request.
    pub headers: HeaderMap,

    /// Query parameters for this request, in insertion order.
    pub query_params: Vec<(String, String)>,
}

impl RequestMetadata {
    /// Creates a new `RequestMetadata` with the given method and endpoint.
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            headers: HeaderMap::new(),
            query_params: Vec::new(),
        }
    }

    /// Sets a header for this call only; it overrides a client default of the same name.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigurationError`](crate::Error::ConfigurationError) if the name
    /// or value is not a legal HTTP header.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> crate::Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Appends a query parameter. Repeated keys are sent repeatedly.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    /// Appends several query parameters.
    pub fn with_query_params(
        mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.query_params.extend(params);
        self
    }
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self::new(Method::GET, "")
    }
}

pub(crate) fn parse_header(name: &str, value: &str) -> crate::Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::try_from(name).map_err(|e| {
        crate::Error::ConfigurationError(format!("Invalid header name {:?}: {}", name, e))
    })?;
    let header_value = HeaderValue::try_from(value).map_err(|e| {
        crate::Error::ConfigurationError(format!("Invalid value for header {}: {}", name, e))
    })?;
    Ok((header_name, header_value))
}

/// A fully resolved request, built per call and handed to the transport.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// The HTTP method.
    pub method: Method,
    /// Absolute URL: base URL joined with the endpoint.
    pub url: Url,
    /// Default headers merged with per-call headers.
    pub headers: HeaderMap,
    /// Query parameters.
    pub query_params: Vec<(String, String)>,
    /// Normalized JSON body. `None` sends no body at all.
    pub body: Option<Map<String, Value>>,
}

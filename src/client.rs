//! API-client facade with payload normalization, observability and error mapping.
//!
//! The [`ApiClient`] type is the main entry point for making HTTP requests.
//! Use [`ApiClientBuilder`] to configure and create clients.

use crate::{
    metadata::{parse_header, RequestEnvelope, RequestMetadata},
    observe::{NoopSink, Observer, ReportSink},
    payload::{self, Payload},
    retry::RetryPolicy,
    transport::{Timeouts, Transport},
    Error, Response, Result,
};
use http::{HeaderMap, Method};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Characters of a body kept in log records by default.
pub const DEFAULT_BODY_LOG_LIMIT: usize = 1000;

/// An HTTP API client with retries, structured logging and typed errors.
///
/// The client is designed to be reused across many requests and tasks. Clones share
/// one connection pool; it is released when the last clone is dropped or closed.
///
/// # Examples
///
/// ```no_run
/// use booker_client::{ApiClient, Payload, RetryPolicy};
/// use serde_json::json;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), booker_client::Error> {
/// let client = ApiClient::builder()
///     .base_url("https://api.example.com")?
///     .retry_policy(RetryPolicy::default().with_backoff_factor(Duration::from_millis(200)))
///     .build()?;
///
/// // GET request, no body
/// let booking = client.get("/booking/1").await?;
/// println!("Booking: {}", booking.text());
///
/// // POST request with a raw JSON map
/// let body = Payload::try_from(json!({"username": "admin", "password": "password123"}))?;
/// let auth = client.post("/auth", body).await?;
/// println!("Auth status: {}", auth.status);
///
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Transport,
    base_url: Url,
    default_headers: HeaderMap,
    observer: Observer,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("transport", &self.inner.transport)
            .finish()
    }
}

impl ApiClient {
    /// Creates a new `ApiClientBuilder` for configuring a client.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// Creates a client with default settings for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::builder().base_url(base_url)?.build()
    }

    /// The base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The transport carrying this client's requests.
    pub fn transport(&self) -> &Transport {
        &self.inner.transport
    }

    /// Resolves `endpoint` against the base URL.
    ///
    /// Absolute paths (`/booking/1`) replace the base URL's path; relative ones are
    /// resolved against it, following RFC 3986.
    pub fn resolve(&self, endpoint: &str) -> Result<Url> {
        Ok(self.inner.base_url.join(endpoint)?)
    }

    /// Makes a request. Every verb helper goes through here.
    ///
    /// # Errors
    ///
    /// * [`Error::HttpError`] for 4xx/5xx responses, with the status and the
    ///   best-effort parsed body.
    /// * [`Error::Network`] / [`Error::Timeout`] when no response was received after
    ///   the retry policy gave up.
    /// * [`Error::InvalidUrl`] / [`Error::SerializationFailed`] for bad input.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use booker_client::{ApiClient, metadata::RequestMetadata};
    /// use http::Method;
    ///
    /// # async fn example() -> Result<(), booker_client::Error> {
    /// let client = ApiClient::new("https://api.example.com")?;
    ///
    /// let metadata = RequestMetadata::new(Method::GET, "/booking")
    ///     .with_query_param("firstname", "Alex");
    ///
    /// let response = client.call(metadata, None).await?;
    /// println!("{}", response.text());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call(
        &self,
        metadata: RequestMetadata,
        payload: Option<Payload<'_>>,
    ) -> Result<Response> {
        let url = self.resolve(&metadata.endpoint)?;
        let body = payload::normalize(payload.as_ref())?;

        let mut headers = self.inner.default_headers.clone();
        headers.extend(metadata.headers);

        let envelope = RequestEnvelope {
            method: metadata.method,
            url,
            headers,
            query_params: metadata.query_params,
            body,
        };

        self.inner.observer.before_send(&envelope);

        let start_time = Instant::now();
        let delivery = self.inner.transport.request(&envelope).await?;

        let status = delivery.status;
        let response = Response::new(
            status,
            delivery.headers,
            delivery.body,
            start_time.elapsed(),
            delivery.attempts,
        );

        self.inner.observer.after_response(&envelope, &response);

        if status.is_client_error() || status.is_server_error() {
            if status.is_client_error() {
                tracing::error!(
                    status = status.as_u16(),
                    method = %envelope.method,
                    url = %envelope.url,
                    "Client error (4xx)"
                );
            } else {
                tracing::warn!(
                    status = status.as_u16(),
                    method = %envelope.method,
                    url = %envelope.url,
                    attempts = response.attempts,
                    "Server error (5xx)"
                );
            }

            let (headers, raw_body) = response.into_parts();
            return Err(Error::from_response(
                status,
                envelope.method,
                envelope.url.as_str(),
                raw_body,
                headers,
            ));
        }

        Ok(response)
    }

    /// Makes a GET request to `endpoint`.
    pub async fn get(&self, endpoint: impl Into<String>) -> Result<Response> {
        self.call(RequestMetadata::new(Method::GET, endpoint), None)
            .await
    }

    /// Makes a POST request to `endpoint` with a JSON body.
    pub async fn post<'a>(
        &self,
        endpoint: impl Into<String>,
        payload: impl Into<Payload<'a>>,
    ) -> Result<Response> {
        self.call(
            RequestMetadata::new(Method::POST, endpoint),
            Some(payload.into()),
        )
        .await
    }

    /// Makes a PUT request to `endpoint` with a JSON body.
    pub async fn put<'a>(
        &self,
        endpoint: impl Into<String>,
        payload: impl Into<Payload<'a>>,
    ) -> Result<Response> {
        self.call(
            RequestMetadata::new(Method::PUT, endpoint),
            Some(payload.into()),
        )
        .await
    }

    /// Makes a PATCH request to `endpoint` with a JSON body.
    pub async fn patch<'a>(
        &self,
        endpoint: impl Into<String>,
        payload: impl Into<Payload<'a>>,
    ) -> Result<Response> {
        self.call(
            RequestMetadata::new(Method::PATCH, endpoint),
            Some(payload.into()),
        )
        .await
    }

    /// Makes a DELETE request to `endpoint`.
    pub async fn delete(&self, endpoint: impl Into<String>) -> Result<Response> {
        self.call(RequestMetadata::new(Method::DELETE, endpoint), None)
            .await
    }

    /// Releases this handle. The connection pool closes with the last handle.
    pub fn close(self) {
        tracing::debug!(base_url = %self.inner.base_url, "Closing API client");
    }
}

/// Builder for configuring and creating an [`ApiClient`].
///
/// # Examples
///
/// ```no_run
/// use booker_client::{ApiClientBuilder, RetryPolicy, Timeouts};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), booker_client::Error> {
/// let client = ApiClientBuilder::new()
///     .base_url("https://api.example.com")?
///     .timeouts(Timeouts::new(Duration::from_secs(3), Duration::from_secs(20)))
///     .retry_policy(RetryPolicy::default().with_total(5))
///     .default_header("Accept", "application/json")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ApiClientBuilder {
    base_url: Option<Url>,
    default_headers: HeaderMap,
    retry_policy: RetryPolicy,
    timeouts: Timeouts,
    report_sink: Arc<dyn ReportSink>,
    body_log_limit: usize,
}

impl ApiClientBuilder {
    /// Creates a new `ApiClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            retry_policy: RetryPolicy::default(),
            timeouts: Timeouts::default(),
            report_sink: Arc::new(NoopSink),
            body_log_limit: DEFAULT_BODY_LOG_LIMIT,
        }
    }

    /// Sets the base URL for all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or cannot carry paths.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(url.as_ref())?;
        if url.cannot_be_a_base() {
            return Err(Error::ConfigurationError(format!(
                "Base URL cannot be a base: {}",
                url
            )));
        }
        self.base_url = Some(url);
        Ok(self)
    }

    /// Adds a header sent with every request. Per-call headers of the same name win.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sets the connect/read timeout pair.
    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Sets the sink receiving request/response attachments.
    pub fn report_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.report_sink = sink;
        self
    }

    /// Sets how many characters of a body go into log records.
    pub fn body_log_limit(mut self, limit: usize) -> Self {
        self.body_log_limit = limit;
        self
    }

    /// Builds the configured `ApiClient`.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided or if the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<ApiClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigurationError("Base URL is required".to_string()))?;

        let transport = Transport::new(self.retry_policy, self.timeouts)?;

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                transport,
                base_url,
                default_headers: self.default_headers,
                observer: Observer::new(self.report_sink, self.body_log_limit),
            }),
        })
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Buffered HTTP response.
//!
//! The facade reads the body once, logs it, and hands the caller a [`Response`]
//! holding the status, headers, timing and raw text. Decoding is left to the caller,
//! usually an endpoint-specific client.

use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// A successful (2xx/3xx) HTTP response.
///
/// # Examples
///
/// ```no_run
/// use booker_client::ApiClient;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct BookingId {
///     bookingid: u64,
/// }
///
/// # async fn example() -> Result<(), booker_client::Error> {
/// let client = ApiClient::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// let response = client.get("/booking").await?;
/// println!("Status: {}, took {:?}", response.status, response.elapsed);
///
/// let ids: Vec<BookingId> = response.json()?;
/// println!("{} bookings", ids.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code, exactly as the server sent it.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from the first attempt until the body was read, retries included.
    pub elapsed: Duration,

    /// The number of attempts made to complete this request.
    pub attempts: usize,

    raw_body: String,
}

impl Response {
    /// Creates a new `Response`.
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        raw_body: String,
        elapsed: Duration,
        attempts: usize,
    ) -> Self {
        Self {
            status,
            headers,
            elapsed,
            attempts,
            raw_body,
        }
    }

    /// The status code as a plain integer.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// The raw response body.
    pub fn text(&self) -> &str {
        &self.raw_body
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`] with the raw body when decoding fails.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.raw_body).map_err(|e| {
            tracing::error!(
                error = %e,
                raw_response = %self.raw_body,
                "Failed to deserialize response"
            );
            Error::DeserializationFailed {
                raw_response: self.raw_body.clone(),
                serde_error: e.to_string(),
                status: self.status,
            }
        })
    }

    /// Returns `true` if the request required retries.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Splits the response into its headers and raw body.
    pub(crate) fn into_parts(self) -> (HeaderMap, String) {
        (self.headers, self.raw_body)
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

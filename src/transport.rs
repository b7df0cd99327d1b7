//! Pooled HTTP transport with retries and fixed timeouts.
//!
//! [`Transport`] owns one `reqwest::Client`, and with it one connection pool. The
//! pool hands each connection to a single in-flight request at a time, so a
//! transport can be shared freely between tasks. The pool is released when the last
//! handle is dropped.

use crate::{
    metadata::RequestEnvelope,
    retry::{FailureKind, RetryPolicy},
    retry_after::retry_after_delay,
    Error, Result,
};
use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// Connect and read timeouts applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Maximum time to establish a connection.
    pub connect: Duration,
    /// Maximum time between reads once the request was sent.
    pub read: Duration,
}

impl Timeouts {
    /// Creates a timeout pair.
    pub fn new(connect: Duration, read: Duration) -> Self {
        Self { connect, read }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            read: Duration::from_secs(30),
        }
    }
}

/// The outcome of [`Transport::request`]: a fully buffered response.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Final status. It may still be an error status.
    pub status: StatusCode,
    /// Final response headers.
    pub headers: HeaderMap,
    /// Response body as text. Empty when an error status arrived with an unreadable body.
    pub body: String,
    /// Attempts made, the first one included.
    pub attempts: usize,
}

/// Connection-pooled sender applying a [`RetryPolicy`] to each request.
#[derive(Debug, Clone)]
pub struct Transport {
    http_client: reqwest::Client,
    policy: RetryPolicy,
    timeouts: Timeouts,
}

impl Transport {
    /// Builds a transport with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the TLS backend cannot be initialized.
    pub fn new(policy: RetryPolicy, timeouts: Timeouts) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .build()
            .map_err(|e| {
                Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            policy,
            timeouts,
        })
    }

    /// The retry policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The timeout pair in use.
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Sends `envelope` and buffers the body, retrying per the policy.
    ///
    /// The body is read inside the retry loop, so a reset or read timeout while it
    /// streams is retried like any failure after sending. A retryable status that
    /// survives every attempt is returned as the final delivery, so the caller still
    /// sees the status. An error status whose body cannot be read is delivered with
    /// an empty body. Any other network failure that survives every attempt becomes
    /// [`Error::Network`] or [`Error::Timeout`].
    pub async fn request(&self, envelope: &RequestEnvelope) -> Result<Delivery> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            tracing::debug!(
                method = %envelope.method,
                url = %envelope.url,
                attempt = attempt,
                "Executing HTTP request"
            );

            let response = match self.send_once(envelope).await {
                Ok(response) => response,
                Err(e) => match self.failure_delay(envelope, &e, attempt) {
                    Some(delay) => {
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    None => return Err(self.give_up(envelope, e, attempt)),
                },
            };

            let status = response.status();
            if self.policy.has_attempts_left(attempt)
                && self.policy.retries_status(&envelope.method, status)
            {
                let server_delay = if self.policy.respect_retry_after {
                    retry_after_delay(response.headers(), self.policy.max_retry_after)
                } else {
                    None
                };
                let delay = server_delay.unwrap_or_else(|| self.policy.backoff(attempt));

                tracing::warn!(
                    status = status.as_u16(),
                    attempt = attempt,
                    method = %envelope.method,
                    url = %envelope.url,
                    delay_ms = delay.as_millis(),
                    retry_after = server_delay.is_some(),
                    "Retryable status, retrying request after delay"
                );

                // Drain so the connection goes back to the pool
                let _ = response.bytes().await;
                tokio::time::sleep(delay).await;
                continue;
            }

            let headers = response.headers().clone();
            match response.text().await {
                Ok(body) => {
                    return Ok(Delivery {
                        status,
                        headers,
                        body,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    if let Some(delay) = self.failure_delay(envelope, &e, attempt) {
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if status.is_client_error() || status.is_server_error() {
                        tracing::warn!(
                            error = %e,
                            status = status.as_u16(),
                            attempt = attempt,
                            method = %envelope.method,
                            url = %envelope.url,
                            "Error response body unreadable, delivering status without body"
                        );
                        return Ok(Delivery {
                            status,
                            headers,
                            body: String::new(),
                            attempts: attempt,
                        });
                    }

                    return Err(self.give_up(envelope, e, attempt));
                }
            }
        }
    }

    /// Delay before the next attempt if `error` is retryable, `None` once the
    /// policy gives up on it.
    fn failure_delay(
        &self,
        envelope: &RequestEnvelope,
        error: &reqwest::Error,
        attempt: usize,
    ) -> Option<Duration> {
        let failure = FailureKind::classify(error);
        if !self.policy.has_attempts_left(attempt)
            || !self.policy.retries_failure(&envelope.method, failure)
        {
            return None;
        }

        let delay = self.policy.backoff(attempt);
        tracing::warn!(
            error = %error,
            failure = ?failure,
            attempt = attempt,
            method = %envelope.method,
            url = %envelope.url,
            delay_ms = delay.as_millis(),
            "Request failed, retrying after delay"
        );
        Some(delay)
    }

    fn give_up(&self, envelope: &RequestEnvelope, error: reqwest::Error, attempt: usize) -> Error {
        tracing::error!(
            error = %error,
            attempt = attempt,
            method = %envelope.method,
            url = %envelope.url,
            "Request failed"
        );
        Error::from_transport(error, envelope.method.clone(), envelope.url.as_str(), attempt)
    }

    /// Executes a single attempt.
    async fn send_once(
        &self,
        envelope: &RequestEnvelope,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .http_client
            .request(envelope.method.clone(), envelope.url.clone())
            .headers(envelope.headers.clone());

        if !envelope.query_params.is_empty() {
            request = request.query(&envelope.query_params);
        }

        if let Some(body) = &envelope.body {
            request = request.json(body);
        }

        request.send().await
    }
}

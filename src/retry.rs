//! Retry policy for transient failures.
//!
//! A [`RetryPolicy`] is an immutable value injected into the transport. It decides
//! which outcomes are retried, how often, and how long to wait in between. It keeps
//! no state across requests.
//!
//! # Non-idempotent methods
//!
//! POST and PATCH are not in the default [`RetryPolicy::allowed_methods`]. Once a
//! request has reached the server, replaying a POST can create a duplicate booking,
//! so a POST answered with 503 is returned as-is after one attempt. A connection
//! failure (DNS, refused, connect timeout) means the request never left the client,
//! and those are retried for every method, POST included.

use http::{Method, StatusCode};
use rand::Rng;
use std::time::Duration;

/// How a single attempt failed before a response was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The connection could not be established. Nothing was sent.
    Connect,
    /// The read timeout elapsed after the request was sent.
    Timeout,
    /// Any other failure after the request was sent (reset, truncated body, ...).
    Other,
}

impl FailureKind {
    /// Classifies a transport error.
    pub fn classify(error: &reqwest::Error) -> Self {
        if error.is_connect() {
            FailureKind::Connect
        } else if error.is_timeout() {
            FailureKind::Timeout
        } else {
            FailureKind::Other
        }
    }
}

/// Governs which failures are retried, how many times and with what backoff.
///
/// # Examples
///
/// ```
/// use booker_client::RetryPolicy;
/// use std::time::Duration;
///
/// // 1 initial attempt + 3 retries, waiting 100ms, 200ms, 400ms
/// let policy = RetryPolicy::default()
///     .with_total(3)
///     .with_backoff_factor(Duration::from_millis(100));
///
/// assert_eq!(policy.max_attempts(), 4);
/// assert_eq!(policy.backoff(3), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub total: usize,
    /// Delay before the first retry; doubled for each following retry.
    pub backoff_factor: Duration,
    /// Upper bound for a single computed backoff.
    pub backoff_max: Duration,
    /// Scale each delay by a random factor between 50% and 100%.
    ///
    /// Off by default. With jitter on, consecutive delays are no longer
    /// guaranteed to increase.
    pub jitter: bool,
    /// Response statuses that trigger a retry.
    pub status_forcelist: Vec<StatusCode>,
    /// Methods that may be retried once the request was sent.
    pub allowed_methods: Vec<Method>,
    /// Wait for the server's `Retry-After` instead of the computed backoff.
    pub respect_retry_after: bool,
    /// Upper bound for a server-requested `Retry-After` wait.
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            total: 3,
            backoff_factor: Duration::from_millis(300),
            backoff_max: Duration::from_secs(10),
            jitter: false,
            status_forcelist: vec![
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
            allowed_methods: vec![
                Method::GET,
                Method::HEAD,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
                Method::TRACE,
            ],
            respect_retry_after: true,
            max_retry_after: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            total: 0,
            ..Default::default()
        }
    }

    /// Sets the number of retries after the first attempt.
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = total;
        self
    }

    /// Sets the base backoff delay.
    pub fn with_backoff_factor(mut self, factor: Duration) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Sets the cap applied to computed backoffs.
    pub fn with_backoff_max(mut self, max: Duration) -> Self {
        self.backoff_max = max;
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replaces the set of retried statuses.
    pub fn with_status_forcelist(mut self, statuses: impl IntoIterator<Item = StatusCode>) -> Self {
        self.status_forcelist = statuses.into_iter().collect();
        self
    }

    /// Replaces the set of methods retried after the request was sent.
    pub fn with_allowed_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.allowed_methods = methods.into_iter().collect();
        self
    }

    /// Configures `Retry-After` handling.
    pub fn with_retry_after(mut self, respect: bool, max_wait: Duration) -> Self {
        self.respect_retry_after = respect;
        self.max_retry_after = max_wait;
        self
    }

    /// Total attempts, the first one included.
    pub fn max_attempts(&self) -> usize {
        self.total.saturating_add(1)
    }

    /// Returns `true` if another attempt may follow attempt number `attempt` (1-indexed).
    pub fn has_attempts_left(&self, attempt: usize) -> bool {
        attempt < self.max_attempts()
    }

    /// Returns `true` if a response with `status` to a `method` request should be retried.
    pub fn retries_status(&self, method: &Method, status: StatusCode) -> bool {
        self.allowed_methods.contains(method) && self.status_forcelist.contains(&status)
    }

    /// Returns `true` if a failed attempt of `method` should be retried.
    pub fn retries_failure(&self, method: &Method, failure: FailureKind) -> bool {
        match failure {
            FailureKind::Connect => true,
            FailureKind::Timeout | FailureKind::Other => self.allowed_methods.contains(method),
        }
    }

    /// Delay before retry number `retry` (1-indexed).
    ///
    /// `backoff_factor * 2^(retry - 1)`, capped at `backoff_max`.
    pub fn backoff(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1).min(31) as u32;
        let multiplier = 2u32.saturating_pow(exponent);
        let delay = self
            .backoff_factor
            .saturating_mul(multiplier)
            .min(self.backoff_max);

        if self.jitter {
            let jitter_factor = rand::thread_rng().gen_range(0.5..=1.0);
            delay.mul_f64(jitter_factor)
        } else {
            delay
        }
    }
}

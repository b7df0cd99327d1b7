//! `Retry-After` header parsing.
//!
//! A server answering 503 may say when it expects to recover. When the retry policy
//! respects that hint, the transport waits for it instead of its own backoff.

use http::HeaderMap;
use std::time::{Duration, SystemTime};

/// Parses the `Retry-After` header.
///
/// Supports both delay-seconds and HTTP-date forms. A date in the past yields a
/// zero delay. Returns `None` when the header is absent or unreadable.
///
/// # Examples
///
/// ```
/// use booker_client::retry_after::parse_retry_after;
/// use http::HeaderMap;
/// use std::time::Duration;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("retry-after", "2".parse().unwrap());
///
/// assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(2)));
/// ```
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = headers.get(http::header::RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = header.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date_time = httpdate::parse_http_date(header).ok()?;
    Some(
        date_time
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO),
    )
}

/// Returns the server-requested delay capped at `max_wait`.
pub fn retry_after_delay(headers: &HeaderMap, max_wait: Duration) -> Option<Duration> {
    parse_retry_after(headers).map(|delay| delay.min(max_wait))
}

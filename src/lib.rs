//! # booker-client - HTTP client facade for QA test suites
//!
//! A retry-aware, observable HTTP client built on top of `reqwest`, plus typed
//! bindings for the Restful-Booker API. Test suites get one error type to assert
//! on, request/response logs for every call, and transient 5xx/connection failures
//! absorbed by an explicit retry policy.
//!
//! ## Quick Start
//!
//! ```no_run
//! use booker_client::{ApiClient, Error, RetryPolicy, Timeouts};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let client = ApiClient::builder()
//!         .base_url("https://api.example.com")?
//!         .timeouts(Timeouts::new(Duration::from_secs(5), Duration::from_secs(30)))
//!         .retry_policy(RetryPolicy::default().with_total(3))
//!         .build()?;
//!
//!     match client.get("/booking/1").await {
//!         Ok(response) => println!("{} in {:?}", response.status, response.elapsed),
//!         Err(err) => println!("status={:?} payload={:?}", err.status_code(), err.payload()),
//!     }
//!
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Layers
//!
//! - [`Transport`] owns the connection pool, the [`RetryPolicy`] and the
//!   connect/read [`Timeouts`].
//! - [`ApiClient`] resolves endpoints, normalizes [`Payload`]s, logs, and maps
//!   4xx/5xx responses and network failures into [`Error`].
//! - [`booker::BookerClient`] maps the booking endpoints onto the facade.
//!
//! ## Retries
//!
//! Only 502/503/504 responses and connection failures are retried by default, with
//! exponential backoff. POST and PATCH are never replayed once the server has seen
//! them; see [`retry`] for the exact rules.

pub mod booker;
mod client;
mod error;
pub mod metadata;
pub mod observe;
pub mod payload;
mod response;
pub mod retry;
pub mod retry_after;
mod transport;

pub use client::{ApiClient, ApiClientBuilder, DEFAULT_BODY_LOG_LIMIT};
pub use error::{Error, Result};
pub use observe::{AttachmentKind, NoopSink, ReportSink};
pub use payload::{FieldMapping, JsonMap, Payload, Schema};
pub use response::Response;
pub use retry::RetryPolicy;
pub use transport::{Delivery, Timeouts, Transport};

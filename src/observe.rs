//! Request/response observability.
//!
//! Every call emits a pre-send and a post-response record through `tracing`, and
//! hands the same data to a [`ReportSink`] as named attachments (a test report, an
//! HTML log, ...). Observability never fails a request: sink errors are logged and
//! dropped, and a panicking sink is contained.

use crate::metadata::RequestEnvelope;
use crate::response::Response;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Error type returned by report sinks.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Format of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// Plain text.
    Text,
    /// A JSON document.
    Json,
}

/// Destination for named request/response blobs.
///
/// Implementations must be cheap; they run inline on the request path.
pub trait ReportSink: Send + Sync {
    /// Records one named attachment.
    fn attach(&self, name: &str, kind: AttachmentKind, content: &str) -> Result<(), SinkError>;
}

/// A sink that discards everything. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ReportSink for NoopSink {
    fn attach(&self, _name: &str, _kind: AttachmentKind, _content: &str) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Emits the structured records of one client.
#[derive(Clone)]
pub(crate) struct Observer {
    sink: Arc<dyn ReportSink>,
    body_limit: usize,
}

impl Observer {
    pub(crate) fn new(sink: Arc<dyn ReportSink>, body_limit: usize) -> Self {
        Self { sink, body_limit }
    }

    /// Pre-send record: method, URL, query and truncated body.
    pub(crate) fn before_send(&self, envelope: &RequestEnvelope) {
        let body = envelope
            .body
            .as_ref()
            .and_then(|body| serde_json::to_string(body).ok());

        tracing::debug!(
            method = %envelope.method,
            url = %envelope.url,
            params = ?envelope.query_params,
            body = body.as_deref().map(|b| truncate_for_log(b, self.body_limit)).unwrap_or("-"),
            "Sending request"
        );

        if let Some(body) = envelope
            .body
            .as_ref()
            .and_then(|body| serde_json::to_string_pretty(body).ok())
        {
            let name = format!("Request {} {}", envelope.method, envelope.url);
            self.attach(&name, AttachmentKind::Json, &body);
        }
    }

    /// Post-response record: status, elapsed time, attempts and truncated body.
    pub(crate) fn after_response(&self, envelope: &RequestEnvelope, response: &Response) {
        tracing::debug!(
            method = %envelope.method,
            url = %envelope.url,
            status = response.status.as_u16(),
            latency_ms = response.elapsed.as_millis(),
            attempts = response.attempts,
            body = truncate_for_log(response.text(), self.body_limit),
            "Received response"
        );

        let name = format!("Response {}", response.status.as_u16());
        self.attach(&name, AttachmentKind::Text, response.text());
    }

    fn attach(&self, name: &str, kind: AttachmentKind, content: &str) {
        match catch_unwind(AssertUnwindSafe(|| self.sink.attach(name, kind, content))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(error = %e, attachment = name, "Report sink rejected attachment");
            }
            Err(_) => {
                tracing::warn!(attachment = name, "Report sink panicked");
            }
        }
    }
}

/// Cuts `text` to at most `limit` characters, respecting UTF-8 boundaries.
pub fn truncate_for_log(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

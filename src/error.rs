//! Error taxonomy for the dispatcher.
//!
//! # Design Decisions
//! - Retryable vs fatal is a compile-time-checked branch, not a string match
//! - Connection failures never reach the caller directly; they accumulate in
//!   the trace and surface wholesale on budget exhaustion
//! - Everything else crosses the boundary unchanged

use std::fmt;

use thiserror::Error;
use url::Url;

/// One failed attempt against one node, recorded for the lifetime of a
/// single dispatch call.
#[derive(Debug)]
pub struct ConnectionFailure {
    /// Endpoint of the node that failed.
    pub endpoint: Url,
    /// The underlying transport error.
    pub error: reqwest::Error,
}

impl fmt::Display for ConnectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.error)
    }
}

/// Outcome classification for a single node attempt.
///
/// Produced by [`crate::node::NodeHandle::request`]; inspected by the
/// dispatcher's retry loop.
#[derive(Debug, Error)]
pub enum CallError {
    /// Transport-level failure: DNS, refused, reset, handshake, or the
    /// per-attempt timeout. Retryable against another node.
    #[error("connection to {endpoint} failed: {source}")]
    Connection {
        endpoint: Url,
        #[source]
        source: reqwest::Error,
    },

    /// Any other request failure (protocol error, malformed response body).
    /// Not transient; propagated to the caller unchanged.
    #[error(transparent)]
    Request(reqwest::Error),

    /// The request path could not be combined with the node endpoint.
    #[error("invalid request path '{path}': {source}")]
    Path {
        path: String,
        #[source]
        source: url::ParseError,
    },
}

impl CallError {
    /// True for failures worth retrying on a different node.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CallError::Connection { .. })
    }
}

/// Errors surfaced to callers of [`crate::Transport::forward_request`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The overall time budget was exhausted before any node produced a
    /// response. Carries every connection failure observed, in order.
    #[error("request timed out after {} connection failure(s)", .trace.len())]
    Timeout { trace: Vec<ConnectionFailure> },

    /// A node was reached but the request failed at the application or
    /// protocol level. Re-raised verbatim.
    #[error(transparent)]
    Request(reqwest::Error),

    /// The request path could not be combined with the node endpoint.
    #[error("invalid request path '{path}': {source}")]
    Path {
        path: String,
        #[source]
        source: url::ParseError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_reports_trace_length() {
        let err = TransportError::Timeout { trace: Vec::new() };
        assert_eq!(err.to_string(), "request timed out after 0 connection failure(s)");
    }
}

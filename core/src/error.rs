//! Error types for the campus API client.
//!
//! # Design
//! Non-2xx statuses are not split by code: a 404 and a 500 both land in
//! `Request`, carrying the endpoint and whatever the server said. Transport
//! failures keep the transport's own error as their source so callers can
//! still inspect it.

use chrono::NaiveDate;
use thiserror::Error;

/// Boxed error produced by a `Transport` when no response was received.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `ApiClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connectivity, DNS, timeout).
    #[error("network error: {0}")]
    Network(#[source] TransportError),

    /// The server answered with a non-2xx status.
    #[error("request to {endpoint} failed: {detail}")]
    Request {
        endpoint: String,
        status: u16,
        /// Response body, or the status line when the body was empty.
        detail: String,
    },

    /// A 2xx response body did not match the expected type.
    #[error("could not decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request payload could not be serialized to JSON.
    #[error("could not encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The base URL is missing or unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An event ends before it starts.
    #[error("event ends ({end}) before it starts ({start})")]
    InvalidEvent { start: NaiveDate, end: NaiveDate },
}

impl ApiError {
    /// HTTP status of a `Request` failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

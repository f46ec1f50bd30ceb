//! Error type for every request the crate performs.
//!
//! # Design
//! The set is closed: a caller can match exhaustively on how an exchange
//! failed. `HttpStatus` and `DecodeFailure` keep the response text so a
//! failed call can still be diagnosed. `InvalidRequest` covers mistakes
//! caught before anything is put on the wire.

use std::time::Duration;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by `Transport::send` and every client operation.
#[derive(Debug, Error)]
pub enum RequestError {
    /// No response was received: refused or reset connection, DNS failure.
    #[error("network error: {source}")]
    Network {
        #[source]
        source: BoxError,
    },

    /// No terminal outcome within the request's timeout.
    #[error("request timed out after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },

    /// A response arrived with a status outside `200..300`.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The status was a success but the payload could not be decoded.
    #[error("failed to decode response body: {source}")]
    DecodeFailure {
        #[source]
        source: BoxError,
        body: String,
    },

    /// The request could not be constructed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RequestError {
    pub fn network(source: impl Into<BoxError>) -> Self {
        RequestError::Network {
            source: source.into(),
        }
    }

    pub fn decode(source: impl Into<BoxError>, body: impl Into<String>) -> Self {
        RequestError::DecodeFailure {
            source: source.into(),
            body: body.into(),
        }
    }

    /// Status code of an `HttpStatus` failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response text attached to the failure, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            RequestError::HttpStatus { body, .. } | RequestError::DecodeFailure { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Timeout { .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, RequestError::Network { .. })
    }

    /// Whether repeating the same request could plausibly succeed. Nothing in
    /// this crate retries; this is for callers layering their own policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            RequestError::Network { .. } | RequestError::Timeout { .. } => true,
            RequestError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            RequestError::DecodeFailure { .. } | RequestError::InvalidRequest(_) => false,
        }
    }
}

//! Gateway error types with client error-code mapping.
//!
//! [`GatewayError`] covers the failures the multiplexer reports to the
//! client (scoped to one subscription) plus startup failures. [`StreamError`]
//! is the asynchronous failure of a running event stream. Both render into
//! the same [`ErrorBody`] carried by the `error` envelope.

use serde::{Deserialize, Serialize};

/// Error payload carried by an outbound `error` envelope.
///
/// ```json
/// { "code": 404, "message": "Not found" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Numeric error code (HTTP-style).
    pub code: u16,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum with client error-code mapping.
///
/// # Error Codes
///
/// | Variant          | Code | Client message          |
/// |------------------|------|-------------------------|
/// | `StreamNotFound` | 404  | `Not found`             |
/// | `InvalidSource`  | 500  | `Internal Server Error` |
/// | `InvalidConfig`  | 500  | `Internal Server Error` |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No stream with the given name is registered in the catalog.
    #[error("stream not found: {0}")]
    StreamNotFound(String),

    /// A catalog factory failed to produce a streamable source.
    #[error("stream `{name}` did not produce a source: {reason}")]
    InvalidSource {
        /// Requested stream name.
        name: String,
        /// Why the factory output was rejected.
        reason: String,
    },

    /// A configuration value could not be parsed at startup.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u16 {
        match self {
            Self::StreamNotFound(_) => 404,
            Self::InvalidSource { .. } | Self::InvalidConfig(_) => 500,
        }
    }

    /// Returns the fixed message exposed to the client.
    ///
    /// Internal details stay in the server log.
    #[must_use]
    pub const fn client_message(&self) -> &'static str {
        match self {
            Self::StreamNotFound(_) => "Not found",
            Self::InvalidSource { .. } | Self::InvalidConfig(_) => "Internal Server Error",
        }
    }

    /// Builds the client-facing [`ErrorBody`] for this error.
    #[must_use]
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.error_code(),
            message: self.client_message().to_string(),
        }
    }
}

/// Failure raised by an event stream while it is running, or by a factory
/// that cannot open one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stream error {code}: {message}")]
pub struct StreamError {
    /// Numeric error code forwarded to the client.
    pub code: u16,
    /// Human-readable message forwarded to the client.
    pub message: String,
}

impl StreamError {
    /// Creates a stream error with an explicit code.
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates a 500 stream error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }
}

impl From<&StreamError> for ErrorBody {
    fn from(err: &StreamError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
        }
    }
}

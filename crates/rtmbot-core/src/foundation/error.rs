//! Unified error types for the rtmbot core.
//!
//! Runtime-level errors (handshake, configuration) live in `rtmbot-runtime`.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur on the persistent connection.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Dialing the endpoint failed.
    #[error("connection failed: {url} - {reason}")]
    ConnectionFailed {
        /// The URL that failed to connect.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The peer closed the connection.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// Reading a frame from an established connection failed.
    #[error("failed to read frame: {0}")]
    ReadFailed(String),

    /// Writing a frame failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Errors returned by remote method calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The service answered with a non-success HTTP status.
    #[error("HTTP {status} error: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        body: String,
    },

    /// The request could not be sent.
    #[error("request failed: {0}")]
    Request(String),

    /// The response body was not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The service reported `ok: false`.
    #[error("{method} failed: {error}")]
    Remote {
        /// The method that was called.
        method: String,
        /// The error string reported by the service.
        error: String,
    },

    /// This caller cannot perform remote calls.
    #[error("API calls are not supported by this caller")]
    NotSupported,
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

// =============================================================================
// Decode Errors
// =============================================================================

/// A frame could not be decoded into an [`Event`](super::event::Event).
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// The frame is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(String),

    /// The frame is valid JSON but not an object.
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

// =============================================================================
// Pattern Errors
// =============================================================================

/// A text pattern passed to `listen` / `respond` failed to compile.
#[derive(Debug, Clone, Error)]
#[error("invalid pattern: {0}")]
pub struct PatternError(#[from] regex::Error);

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

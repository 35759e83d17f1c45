//! Error types for passgate.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, storage and input validation errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for passgate operations.
///
/// Every failure in the session layer resolves to one of these variants.
/// None of them is fatal: callers either see a value they can report, or the
/// session falls back to the logged-out state.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The login exchange was rejected.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Non-success HTTP responses from the backend.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Durable storage errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (bad URL, namespace, route pattern).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns the most specific human-readable message the server sent, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Error::Protocol(err) => err.detail.as_deref(),
            _ => None,
        }
    }

    /// Returns true if this error is an authorization failure (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Error::Protocol(err) => err.is_auth_error(),
            Error::Auth(_) => true,
            _ => false,
        }
    }
}

/// Errors that can describe themselves with a server-provided detail message.
///
/// Used by [`crate::Loader`] to record the most specific message available.
pub trait ErrorDetail: fmt::Display {
    /// Server-provided detail, if this error carries one.
    fn detail(&self) -> Option<&str> {
        None
    }

    /// The detail when present, otherwise the display text.
    fn user_message(&self) -> String {
        match self.detail() {
            Some(detail) => detail.to_string(),
            None => self.to_string(),
        }
    }
}

impl ErrorDetail for Error {
    fn detail(&self) -> Option<&str> {
        Error::detail(self)
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Response body could not be decoded.
    #[error("invalid response body: {message}")]
    Decode { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else if err.is_decode() {
            TransportError::Decode {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::from(err))
    }
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend rejected the identifier/secret pair.
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// A non-success response from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Human-readable `detail` from the error body, if present.
    pub detail: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, detail: Option<String>) -> Self {
        Self { status, detail }
    }

    /// Check if this is an authorization failure.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401
    }
}

/// Durable storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem I/O failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// Stored data could not be encoded or decoded.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// The storage lock could not be acquired.
    #[error("storage lock failed: {message}")]
    Lock { message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Invalid storage namespace.
    #[error("invalid namespace '{value}': {reason}")]
    Namespace { value: String, reason: String },

    /// Invalid route pattern.
    #[error("invalid route pattern '{value}': {reason}")]
    RoutePattern { value: String, reason: String },

    /// Unknown application profile.
    #[error("unknown application '{value}'")]
    AppProfile { value: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

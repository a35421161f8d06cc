//! Error types for Jolt.
//!
//! This module provides the [`JoltError`] type, the standard error type used
//! throughout the framework. Every variant maps to a specific HTTP status
//! code, and the pipeline's outer boundary renders uncaught errors into a
//! single JSON error envelope response.

use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`JoltError`].
pub type JoltResult<T> = Result<T, JoltError>;

/// Standard error type for Jolt.
///
/// `JoltError` provides structured errors with HTTP status code mapping.
/// Pipeline steps do not swallow errors; a failure either mutates the
/// response to a terminal state or propagates one of these variants for
/// the outer boundary to render.
///
/// # Example
///
/// ```
/// use jolt_core::JoltError;
/// use http::StatusCode;
///
/// let err = JoltError::not_found("/missing");
/// assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
/// ```
#[derive(Error, Debug)]
pub enum JoltError {
    /// No route matches the request path.
    #[error("No route matches {path}")]
    NotFound {
        /// The request path that failed to match.
        path: String,
    },

    /// The path exists but not for the request method.
    #[error("Method not allowed for {path}")]
    MethodNotAllowed {
        /// The request path.
        path: String,
        /// Comma-joined list of methods valid for this path.
        allow: String,
    },

    /// Authentication required or failed.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message.
        message: String,
        /// `WWW-Authenticate` challenge value, when a strategy produced one.
        challenge: Option<String>,
    },

    /// Access denied.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Human-readable error message.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limited")]
    RateLimited {
        /// Seconds until the client may retry.
        retry_after_seconds: u64,
    },

    /// Malformed request.
    #[error("Bad request: {message}")]
    BadRequest {
        /// Human-readable error message.
        message: String,
    },

    /// Internal framework error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
    },
}

impl JoltError {
    /// Creates a not-found error for the given path.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a method-not-allowed error with the valid methods for the path.
    pub fn method_not_allowed(path: impl Into<String>, allow: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            path: path.into(),
            allow: allow.into(),
        }
    }

    /// Creates an unauthorized error without a challenge header.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            challenge: None,
        }
    }

    /// Creates an unauthorized error carrying a `WWW-Authenticate` value.
    pub fn challenge(message: impl Into<String>, challenge: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            challenge: Some(challenge.into()),
        }
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a bad-request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the standard JSON error envelope body for this error.
    #[must_use]
    pub fn envelope(&self, request_id: &str) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "request_id": request_id,
            }
        })
    }

    /// Returns the machine-readable error code for the JSON envelope.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::BadRequest { .. } => "BAD_REQUEST",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

//! Error types for VMmanager sessions.
//!
//! Every request either returns a decoded JSON body or fails with one of the
//! variants below. Nothing is retried or recovered locally.

use thiserror::Error;

/// Main error type for VMmanager operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The server answered with a status code of 400 or higher.
    #[error("HTTP {status} {reason} for {url}: {body}")]
    HttpResponse {
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase for the status code
        reason: String,
        /// Response body text, empty when it could not be read
        body: String,
        /// Request URL
        url: String,
    },

    /// Transport failure reported by the HTTP client (connect, TLS, DNS, timeout).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was empty or not valid JSON.
    #[error("Failed to decode response from {url}: {message}")]
    Decode {
        /// Request URL
        url: String,
        /// Decoder message
        message: String,
    },

    /// A request body could not be serialized.
    #[error("Failed to encode request body: {0}")]
    Encode(String),

    /// The composed request URL is invalid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid resource identifier
    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}

/// Specialized result type for VMmanager operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::HttpResponse { .. } => "HTTP_RESPONSE",
            Self::Transport(_) => "TRANSPORT",
            Self::Decode { .. } => "DECODE",
            Self::Encode(_) => "ENCODE",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidId(_) => "INVALID_ID",
        }
    }

    /// Returns the HTTP status code when the server rejected the request.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::HttpResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for 4xx responses.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::HttpResponse { status, .. } if *status >= 400 && *status < 500)
    }

    /// Returns true for 5xx responses.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::HttpResponse { status, .. } if *status >= 500)
    }

    /// Returns true if the HTTP client gave up waiting.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_timeout())
    }

    /// Returns the response body of a rejected request.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::HttpResponse { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}

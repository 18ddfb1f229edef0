//! Error types for Anvil API operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Result type for Anvil operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A single error record returned by the API.
///
/// The API reports failures either as `{"errors": [{"message": ...}]}` or as
/// `{"fields": [{"message": ..., "property": ...}]}`. Records that are not
/// objects are kept as their string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Human readable message.
    pub message: String,
    /// Field the error refers to, when the API names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The record exactly as the server sent it.
    #[serde(default)]
    pub raw: Value,
}

impl ErrorDetail {
    /// Create a detail with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            raw: Value::String(message.clone()),
            message,
            field: None,
        }
    }

    /// Build a detail from an arbitrary JSON record.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => {
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string());
                let field = map
                    .get("property")
                    .or_else(|| map.get("field"))
                    .or_else(|| map.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Self {
                    message,
                    field,
                    raw: value.clone(),
                }
            }
            Value::String(s) => Self {
                message: s.clone(),
                field: None,
                raw: value.clone(),
            },
            other => Self {
                message: other.to_string(),
                field: None,
                raw: other.clone(),
            },
        }
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Join the messages of a list of error records with `", "`.
pub fn join_messages(errors: &[ErrorDetail]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Anvil client errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration (API key, environment).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// HTTP 400.
    #[error("Validation error: {message}")]
    Validation {
        /// Server provided message.
        message: String,
        /// HTTP status code.
        status: u16,
        /// Parsed error records.
        errors: Vec<ErrorDetail>,
    },

    /// HTTP 401.
    #[error("Authentication error: {message}")]
    Authentication {
        /// Guidance message.
        message: String,
        /// HTTP status code.
        status: u16,
        /// Parsed error records.
        errors: Vec<ErrorDetail>,
    },

    /// HTTP 404, or a lookup that matched nothing.
    #[error("Not found: {message}")]
    NotFound {
        /// What was not found.
        message: String,
        /// HTTP status code, absent for resource lookups that came back empty.
        status: Option<u16>,
        /// Parsed error records.
        errors: Vec<ErrorDetail>,
    },

    /// HTTP 429 after retries were exhausted.
    #[error("Rate limit exceeded after {retries} retries: {message}")]
    RateLimit {
        /// Error message.
        message: String,
        /// Number of retries performed.
        retries: u32,
        /// Server supplied retry hint.
        retry_after: Option<Duration>,
        /// Parsed error records.
        errors: Vec<ErrorDetail>,
    },

    /// HTTP 5xx.
    #[error("Server error ({status}): {message}")]
    Server {
        /// Server provided message.
        message: String,
        /// HTTP status code.
        status: u16,
        /// Parsed error records.
        errors: Vec<ErrorDetail>,
    },

    /// GraphQL `errors` array in an otherwise successful response.
    #[error("GraphQL error: {message}")]
    GraphQL {
        /// Comma separated list of the individual messages.
        message: String,
        /// HTTP status code (usually 200).
        status: u16,
        /// Individual error records.
        errors: Vec<ErrorDetail>,
    },

    /// Any other API failure.
    #[error("API error: {message}")]
    Api {
        /// Error message.
        message: String,
        /// HTTP status code, when the failure came from a response.
        status: Option<u16>,
        /// Parsed error records.
        errors: Vec<ErrorDetail>,
    },

    /// Connection level failure after retries were exhausted.
    #[error("Network error after {retries} retries: {message}")]
    Network {
        /// Last underlying error message.
        message: String,
        /// Number of retries performed.
        retries: u32,
    },

    /// Local file failure.
    #[error("File error: {0}")]
    File(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A single transport attempt failed before a response was received.
    ///
    /// The rate limiter converts retryable instances into [`Error::Network`].
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection failure reported without an underlying client error.
    #[error("Connection error: {0}")]
    Connection(String),
}

impl Error {
    /// Build an [`Error::Api`] without a status code.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status: None,
            errors: Vec::new(),
        }
    }

    /// Build an [`Error::NotFound`] for a lookup that matched nothing.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            status: None,
            errors: Vec::new(),
        }
    }

    /// Check whether this error originated from the API.
    pub fn is_api_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::Authentication { .. }
                | Self::NotFound { .. }
                | Self::RateLimit { .. }
                | Self::Server { .. }
                | Self::GraphQL { .. }
                | Self::Api { .. }
        )
    }

    /// Check if a single failed attempt is worth retrying.
    ///
    /// Only connection level failures qualify, including a connection that
    /// drops while the body is read; HTTP statuses are handled by the rate
    /// limiter itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            // Bodies are read as raw bytes, so body and decode errors can only
            // come from the transport.
            Self::Http(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() || e.is_decode()
            }
            _ => false,
        }
    }

    /// Get the HTTP status code, if known.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Validation { status, .. }
            | Self::Authentication { status, .. }
            | Self::Server { status, .. }
            | Self::GraphQL { status, .. } => Some(*status),
            Self::NotFound { status, .. } | Self::Api { status, .. } => *status,
            Self::RateLimit { .. } => Some(429),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get the parsed error records carried by an API error.
    pub fn errors(&self) -> &[ErrorDetail] {
        match self {
            Self::Validation { errors, .. }
            | Self::Authentication { errors, .. }
            | Self::NotFound { errors, .. }
            | Self::RateLimit { errors, .. }
            | Self::Server { errors, .. }
            | Self::GraphQL { errors, .. }
            | Self::Api { errors, .. } => errors,
            _ => &[],
        }
    }
}

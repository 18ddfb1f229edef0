//! HTTP response wrapper.

use crate::error::{join_messages, ErrorDetail};
use crate::{Error, Result};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Content type fragments that mark a body as binary.
const BINARY_MARKERS: &[&str] = &["application/pdf", "application/octet-stream", "application/zip"];

/// Longest server supplied retry delay that is honoured.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

/// Header names for rate limit metadata.
pub mod headers {
    /// Request budget for the current window.
    pub const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
    /// Requests left in the current window.
    pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
    /// When the current window resets.
    pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
    /// Seconds to wait before retrying.
    pub const RETRY_AFTER: &str = "retry-after";
}

/// A terminal HTTP reply with derived views over its body.
///
/// Immutable once constructed; the JSON body is decoded once up front.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    parsed: Option<Value>,
}

impl Response {
    /// Create a response from its parts.
    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let parsed = parse_body(&headers, &body);
        Self {
            status,
            headers,
            body,
            parsed,
        }
    }

    /// Create a response from a reqwest response, reading the full body.
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self::from_parts(status, headers, body))
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Check if the response was successful (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if the response was a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Check if the response was a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a specific header value. Lookup is case-insensitive.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref().to_ascii_lowercase().as_str())
            .and_then(|v| v.to_str().ok())
    }

    /// Get the content type if available.
    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE.as_str())
    }

    /// Check whether the body is a binary document rather than text.
    pub fn is_binary(&self) -> bool {
        self.content_type()
            .map(|ct| {
                let ct = ct.to_ascii_lowercase();
                BINARY_MARKERS.iter().any(|marker| ct.contains(marker))
            })
            .unwrap_or(false)
    }

    /// Get the raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume the response and return the raw body.
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Get the body as text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| Error::api(e.to_string()))
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Get the decoded JSON body, if the body was JSON.
    pub fn parsed(&self) -> Option<&Value> {
        self.parsed.as_ref()
    }

    /// Get the body with one level of `{"data": ...}` envelope removed.
    pub fn data(&self) -> Option<&Value> {
        let parsed = self.parsed.as_ref()?;
        match parsed.get("data") {
            Some(data) if parsed.is_object() => Some(data),
            _ => Some(parsed),
        }
    }

    /// Get the error records of a failed response.
    ///
    /// Empty for successful responses and for bodies without an `errors` or
    /// `fields` array.
    pub fn errors(&self) -> Vec<ErrorDetail> {
        if self.is_success() {
            return Vec::new();
        }
        self.error_records(&["errors", "fields"])
    }

    /// Get the GraphQL `errors` array regardless of the status code.
    pub fn graphql_errors(&self) -> Vec<ErrorDetail> {
        self.error_records(&["errors"])
    }

    /// Get a readable message for a failed response.
    pub fn error_message(&self) -> String {
        let errors = self.errors();
        if !errors.is_empty() {
            return join_messages(&errors);
        }
        if let Some(message) = self
            .parsed
            .as_ref()
            .and_then(|p| p.get("message").or_else(|| p.get("error")))
            .and_then(Value::as_str)
        {
            return message.to_string();
        }
        match self.status.canonical_reason() {
            Some(reason) => format!("HTTP {} {}", self.status.as_u16(), reason),
            None => format!("HTTP {}", self.status.as_u16()),
        }
    }

    /// Request budget for the current window.
    pub fn rate_limit_limit(&self) -> Option<u64> {
        self.header_number(headers::RATE_LIMIT_LIMIT)
    }

    /// Requests left in the current window.
    pub fn rate_limit_remaining(&self) -> Option<u64> {
        self.header_number(headers::RATE_LIMIT_REMAINING)
    }

    /// When the current window resets, as sent by the server.
    pub fn rate_limit_reset(&self) -> Option<u64> {
        self.header_number(headers::RATE_LIMIT_RESET)
    }

    /// Server supplied retry delay, when present and positive.
    ///
    /// Values that are not a number of seconds are ignored; large values are
    /// capped at [`MAX_RETRY_AFTER`].
    pub fn retry_after(&self) -> Option<Duration> {
        let secs = self
            .header(headers::RETRY_AFTER)?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|secs| secs.is_finite() && *secs > 0.0)?;
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(MAX_RETRY_AFTER);
        Some(delay.min(MAX_RETRY_AFTER))
    }

    fn header_number(&self, name: &str) -> Option<u64> {
        self.header(name).and_then(|v| v.trim().parse().ok())
    }

    fn error_records(&self, keys: &[&str]) -> Vec<ErrorDetail> {
        let Some(parsed) = self.parsed.as_ref() else {
            return Vec::new();
        };
        keys.iter()
            .find_map(|key| parsed.get(*key).and_then(Value::as_array))
            .map(|records| records.iter().map(ErrorDetail::from_value).collect())
            .unwrap_or_default()
    }
}

/// Decode a JSON body when the content type says JSON, or when no content
/// type was sent at all.
fn parse_body(headers: &HeaderMap, body: &Bytes) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    let content_type = headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase());
    match content_type {
        Some(ct) if ct.contains("json") => serde_json::from_slice(body).ok(),
        Some(_) => None,
        None => serde_json::from_slice(body).ok(),
    }
}

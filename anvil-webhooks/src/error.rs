//! Error types for webhook handling

use thiserror::Error;

/// Result type for webhook operations
pub type Result<T> = std::result::Result<T, WebhookError>;

/// Boxed underlying cause of a webhook error
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while handling an inbound webhook
#[derive(Error, Debug)]
pub enum WebhookError {
    /// Payload is not a webhook document
    #[error("Invalid webhook payload: {0}")]
    Payload(String),

    /// No expected token, or the token did not match
    #[error("Webhook verification failed: {0}")]
    Verification(String),

    /// Encrypted data could not be decoded, decrypted or parsed
    #[error("Webhook decryption failed: {message}")]
    Decryption {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Private key could not be read or parsed
    #[error("Invalid private key: {message}")]
    Key {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl WebhookError {
    /// Decryption failure caused by `source`.
    pub fn decryption(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Decryption {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Key failure caused by `source`.
    pub fn key(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Key {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::Payload(err.to_string())
    }
}

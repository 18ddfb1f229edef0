//! # Anvil Webhooks
//!
//! Verification and decryption of inbound Anvil webhook deliveries.
//!
//! Anvil sends a JSON document with an `action`, a `data` payload and a
//! `timestamp`. The delivery token is compared in constant time against the
//! configured webhook token. When encryption is enabled on the account,
//! `data` arrives as base64 RSA-OAEP ciphertext and is decrypted with the
//! account's private key.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anvil_webhooks::Webhook;
//!
//! # fn handle(body: &str, token: Option<&str>) -> anvil_webhooks::Result<()> {
//! let webhook = Webhook::parse(body, token)?;
//! webhook.verify()?;
//!
//! if webhook.is_signer_complete() {
//!     let data = webhook.decrypt("keys/private_key.pem")?;
//!     println!("signer {:?} finished: {}", webhook.signer_eid(), data);
//! }
//! # Ok(())
//! # }
//! ```

mod action;
mod crypto;
mod error;
mod token;
mod webhook;

pub use action::WebhookAction;
pub use crypto::{decrypt_value, load_private_key, looks_encrypted, parse_private_key};
pub use error::{BoxError, Result, WebhookError};
pub use token::{constant_time_eq, headers};
pub use webhook::Webhook;

pub use rsa::RsaPrivateKey;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::action::WebhookAction;
    pub use crate::error::{Result, WebhookError};
    pub use crate::webhook::Webhook;
}

//! RSA-OAEP decryption of webhook data

use base64::Engine;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Oaep, RsaPrivateKey};
use serde_json::Value;
use sha1::Sha1;
use std::path::Path;

use crate::{Result, WebhookError};

/// Read an RSA private key from a PEM file.
pub fn load_private_key(path: impl AsRef<Path>) -> Result<RsaPrivateKey> {
    let path = path.as_ref();
    let pem = std::fs::read_to_string(path)
        .map_err(|e| WebhookError::key(format!("Failed to read {}: {}", path.display(), e), e))?;
    parse_private_key(&pem)
}

/// Parse an RSA private key from PEM, accepting PKCS#8 and PKCS#1.
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey> {
    if pem.contains("BEGIN RSA PRIVATE KEY") {
        RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| WebhookError::key(e.to_string(), e))
    } else {
        RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| WebhookError::key(e.to_string(), e))
    }
}

/// Check whether a string looks like base64 ciphertext.
pub fn looks_encrypted(data: &str) -> bool {
    let data = data.trim();
    !data.is_empty()
        && data.len() % 4 == 0
        && data
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

/// Decode, decrypt and parse base64 RSA-OAEP (SHA-1) ciphertext.
pub fn decrypt_value(key: &RsaPrivateKey, ciphertext: &str) -> Result<Value> {
    let encrypted = base64::engine::general_purpose::STANDARD
        .decode(ciphertext.trim())
        .map_err(|e| WebhookError::decryption(format!("Invalid base64: {}", e), e))?;

    let plaintext = key
        .decrypt(Oaep::new::<Sha1>(), &encrypted)
        .map_err(|e| WebhookError::decryption(e.to_string(), e))?;

    serde_json::from_slice(&plaintext)
        .map_err(|e| WebhookError::decryption(format!("Decrypted data is not JSON: {}", e), e))
}

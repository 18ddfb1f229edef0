//! Integration tests for webhook verification and decryption.

use anvil_core::{configure, reset, WEBHOOK_TOKEN_ENV};
use anvil_webhooks::{parse_private_key, Webhook, WebhookAction, WebhookError};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

const ENCRYPTED_DATA: &str = include_str!("fixtures/encrypted_data.txt");

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn signer_complete(token: Option<&str>) -> Webhook {
    let payload = r#"{"action":"signerComplete","data":{"signerEid":"s1","etchPacketEid":"p1"},"timestamp":"2024-01-01T00:00:00Z"}"#;
    Webhook::parse(payload, token).unwrap()
}

fn encrypted(action: &str) -> Webhook {
    let payload = json!({
        "action": action,
        "data": ENCRYPTED_DATA.trim(),
        "timestamp": "2024-01-01T00:00:00Z",
    });
    Webhook::from_value(payload, Some("abc")).unwrap()
}

fn clear_env() {
    // SAFETY: every test touching the environment holds ENV_LOCK.
    unsafe {
        std::env::remove_var(WEBHOOK_TOKEN_ENV);
    }
    reset();
}

#[test]
fn test_valid_against_configured_token() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    configure(|c| c.set_webhook_token("abc"));

    let webhook = signer_complete(Some("abc"));
    assert!(webhook.is_valid().unwrap());
    assert!(webhook.verify().is_ok());
    assert!(webhook.is_signer_complete());
    assert_eq!(webhook.signer_eid(), Some("s1"));
    assert_eq!(webhook.packet_eid(), Some("p1"));

    clear_env();
}

#[test]
fn test_valid_against_environment_token() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    // SAFETY: ENV_LOCK is held.
    unsafe {
        std::env::set_var(WEBHOOK_TOKEN_ENV, "from-env");
    }

    assert!(signer_complete(Some("from-env")).is_valid().unwrap());
    assert!(!signer_complete(Some("abc")).is_valid().unwrap());

    clear_env();
}

#[test]
fn test_mismatched_or_absent_token() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    configure(|c| c.set_webhook_token("abc"));

    assert!(!signer_complete(Some("xyz")).is_valid().unwrap());
    assert!(!signer_complete(None).is_valid().unwrap());
    assert!(matches!(
        signer_complete(Some("xyz")).verify(),
        Err(WebhookError::Verification(_))
    ));

    clear_env();
}

#[test]
fn test_no_configured_token_is_an_error() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    assert!(matches!(
        signer_complete(Some("abc")).is_valid(),
        Err(WebhookError::Verification(_))
    ));
}

#[test]
fn test_empty_expected_token_uses_configured_token() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    configure(|c| c.set_webhook_token("abc"));

    assert!(signer_complete(Some("abc")).is_valid_with("").unwrap());
    assert!(!signer_complete(Some("xyz")).is_valid_with("").unwrap());
    assert!(signer_complete(Some("abc")).verify_with("").is_ok());

    clear_env();
}

#[test]
fn test_empty_expected_token_without_configured_token_is_an_error() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    assert!(matches!(
        signer_complete(Some("abc")).is_valid_with(""),
        Err(WebhookError::Verification(_))
    ));
    assert!(matches!(
        signer_complete(Some("abc")).verify_with(""),
        Err(WebhookError::Verification(_))
    ));
}

#[test]
fn test_malformed_json() {
    assert!(matches!(
        Webhook::parse("{\"action\": ", Some("abc")),
        Err(WebhookError::Payload(_))
    ));
}

#[test]
fn test_decrypt_with_pkcs8_key() {
    let webhook = encrypted("signerComplete");
    assert!(webhook.is_encrypted());

    let data = webhook.decrypt(fixture("private_key.pem")).unwrap();
    assert_eq!(
        data,
        json!({"signerEid": "s1", "packetEid": "p1", "status": "completed"})
    );
}

#[test]
fn test_decrypt_with_pkcs1_key() {
    let pem = std::fs::read_to_string(fixture("private_key_pkcs1.pem")).unwrap();
    let key = parse_private_key(&pem).unwrap();

    let data = encrypted("etchPacketComplete").decrypt_with_key(&key).unwrap();
    assert_eq!(data["packetEid"], "p1");
}

#[test]
fn test_decrypt_with_wrong_key() {
    let webhook = encrypted("signerComplete");
    let err = webhook.decrypt(fixture("other_private_key.pem")).unwrap_err();
    assert!(matches!(err, WebhookError::Decryption { .. }));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_decrypt_with_missing_key_file() {
    let webhook = encrypted("signerComplete");
    let err = webhook.decrypt(fixture("missing.pem")).unwrap_err();
    assert!(matches!(err, WebhookError::Key { .. }));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_unencrypted_data_is_returned_as_is() {
    let webhook = signer_complete(Some("abc"));
    assert!(!webhook.is_encrypted());
    assert_eq!(
        webhook.decrypt(fixture("private_key.pem")).unwrap(),
        json!({"signerEid": "s1", "etchPacketEid": "p1"})
    );
}

#[test]
fn test_unknown_action_round_trips() {
    let webhook = Webhook::parse(r#"{"action":"brandNewThing","data":{}}"#, None).unwrap();
    assert_eq!(
        webhook.action(),
        &WebhookAction::Unknown("brandNewThing".to_string())
    );
    assert_eq!(webhook.raw()["action"], "brandNewThing");
    assert!(webhook.timestamp().is_none());
}

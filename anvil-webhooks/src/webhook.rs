//! Inbound webhook parsing and verification

use chrono::{DateTime, Utc};
use rsa::RsaPrivateKey;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

use crate::crypto::{decrypt_value, load_private_key, looks_encrypted};
use crate::token::constant_time_eq;
use crate::{Result, WebhookAction, WebhookError};

/// A parsed webhook delivery
///
/// The token arrives out of band (header or query parameter) and is handed
/// in by the caller; nothing here reads HTTP requests.
#[derive(Debug, Clone)]
pub struct Webhook {
    action: WebhookAction,
    data: Value,
    timestamp: Option<String>,
    token: Option<String>,
    raw: Value,
}

impl Webhook {
    /// Parse a JSON payload together with the token it was delivered with.
    pub fn parse(payload: &str, token: Option<&str>) -> Result<Self> {
        Self::from_slice(payload.as_bytes(), token)
    }

    /// Parse a JSON payload from raw bytes.
    pub fn from_slice(payload: &[u8], token: Option<&str>) -> Result<Self> {
        let raw: Value = serde_json::from_slice(payload)?;
        Self::from_value(raw, token)
    }

    /// Build from an already decoded JSON document.
    pub fn from_value(raw: Value, token: Option<&str>) -> Result<Self> {
        let object = raw
            .as_object()
            .ok_or_else(|| WebhookError::Payload("Payload is not a JSON object".to_string()))?;

        let action = object
            .get("action")
            .and_then(Value::as_str)
            .map(WebhookAction::parse)
            .ok_or_else(|| WebhookError::Payload("Missing 'action'".to_string()))?;

        let data = object
            .get("data")
            .cloned()
            .ok_or_else(|| WebhookError::Payload("Missing 'data'".to_string()))?;

        let timestamp = match object.get("timestamp") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        debug!(action = %action, "Parsed webhook");

        Ok(Self {
            action,
            data,
            timestamp,
            token: token.map(str::to_string).filter(|t| !t.is_empty()),
            raw,
        })
    }

    /// Action that triggered the delivery
    pub fn action(&self) -> &WebhookAction {
        &self.action
    }

    /// Payload data, possibly encrypted
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The whole payload as delivered
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Token the delivery carried
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Delivery time as sent
    pub fn timestamp_raw(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    /// Delivery time, when sent as RFC 3339
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Check the token against the configured webhook token.
    ///
    /// Fails when no token is configured, either on the process-default
    /// configuration or in `ANVIL_WEBHOOK_TOKEN`.
    pub fn is_valid(&self) -> Result<bool> {
        let expected = anvil_core::configuration()
            .webhook_token()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                WebhookError::Verification(format!(
                    "No webhook token configured. Set {} or pass the expected token",
                    anvil_core::WEBHOOK_TOKEN_ENV
                ))
            })?;
        Ok(self.token_matches(&expected))
    }

    /// Check the token against `expected`.
    ///
    /// An empty `expected` falls back to the configured webhook token, as
    /// [`Webhook::is_valid`] does. Returns `false` when the delivery carried
    /// no token.
    pub fn is_valid_with(&self, expected: &str) -> Result<bool> {
        if expected.is_empty() {
            return self.is_valid();
        }
        Ok(self.token_matches(expected))
    }

    fn token_matches(&self, expected: &str) -> bool {
        self.token
            .as_deref()
            .is_some_and(|token| constant_time_eq(token.as_bytes(), expected.as_bytes()))
    }

    /// Require a token matching the configured webhook token.
    pub fn verify(&self) -> Result<()> {
        Self::verified(self.is_valid()?, &self.action)
    }

    /// Require a token matching `expected`.
    pub fn verify_with(&self, expected: &str) -> Result<()> {
        Self::verified(self.is_valid_with(expected)?, &self.action)
    }

    fn verified(valid: bool, action: &WebhookAction) -> Result<()> {
        if valid {
            Ok(())
        } else {
            warn!(action = %action, "Rejected webhook with invalid token");
            Err(WebhookError::Verification("Invalid webhook token".to_string()))
        }
    }

    /// Check whether `data` is ciphertext rather than a structured record.
    pub fn is_encrypted(&self) -> bool {
        self.data.as_str().is_some_and(looks_encrypted)
    }

    /// Decrypt `data` with the PEM private key at `path`.
    ///
    /// Unencrypted data is returned unchanged without reading the key.
    pub fn decrypt(&self, private_key_path: impl AsRef<Path>) -> Result<Value> {
        if !self.is_encrypted() {
            return Ok(self.data.clone());
        }
        let key = load_private_key(private_key_path)?;
        self.decrypt_with_key(&key)
    }

    /// Decrypt `data` with an already loaded private key.
    pub fn decrypt_with_key(&self, key: &RsaPrivateKey) -> Result<Value> {
        match self.data.as_str() {
            Some(ciphertext) if looks_encrypted(ciphertext) => {
                let data = decrypt_value(key, ciphertext)?;
                debug!(action = %self.action, "Decrypted webhook data");
                Ok(data)
            }
            _ => Ok(self.data.clone()),
        }
    }

    /// Is a workflow creation
    pub fn is_workflow_created(&self) -> bool {
        self.action == WebhookAction::WeldCreate
    }

    /// Is a workflow completion
    pub fn is_workflow_complete(&self) -> bool {
        self.action == WebhookAction::WeldComplete
    }

    /// Is a webform completion
    pub fn is_webform_complete(&self) -> bool {
        self.action == WebhookAction::ForgeComplete
    }

    /// Is a signer completion
    pub fn is_signer_complete(&self) -> bool {
        self.action == WebhookAction::SignerComplete
    }

    /// Is a signer status change
    pub fn is_signer_update(&self) -> bool {
        self.action == WebhookAction::SignerUpdateStatus
    }

    /// Is a signature packet completion
    pub fn is_signature_packet_complete(&self) -> bool {
        self.action == WebhookAction::EtchPacketComplete
    }

    /// Is a document group creation
    pub fn is_document_group_created(&self) -> bool {
        self.action == WebhookAction::DocumentGroupCreate
    }

    /// Is a test delivery
    pub fn is_test(&self) -> bool {
        self.action == WebhookAction::WebhookTest
    }

    /// Is any signer event
    pub fn is_signer_event(&self) -> bool {
        self.action.is_signer_event()
    }

    /// Signer eid, for signer events
    pub fn signer_eid(&self) -> Option<&str> {
        if !self.is_signer_event() {
            return None;
        }
        self.data_str(&["signerEid", "signer_eid"])
            .or_else(|| self.nested_eid("signer"))
    }

    /// Signer status, for signer events
    pub fn signer_status(&self) -> Option<&str> {
        if !self.is_signer_event() {
            return None;
        }
        self.data_str(&["signerStatus", "signer_status", "status"])
    }

    /// Signature packet eid, for packet events
    pub fn packet_eid(&self) -> Option<&str> {
        if !self.action.is_packet_event() {
            return None;
        }
        self.data_str(&["etchPacketEid", "packetEid", "packet_eid"])
            .or_else(|| self.nested_eid("etchPacket"))
    }

    /// Workflow eid, for workflow and webform events
    pub fn workflow_eid(&self) -> Option<&str> {
        if !self.action.is_workflow_event() {
            return None;
        }
        self.data_str(&["weldEid", "workflowEid", "weld_eid"])
            .or_else(|| self.nested_eid("weld"))
    }

    /// Submission eid, for workflow and webform events
    pub fn submission_eid(&self) -> Option<&str> {
        if !self.action.is_workflow_event() {
            return None;
        }
        self.data_str(&["submissionEid", "weldDataEid", "submission_eid"])
            .or_else(|| self.nested_eid("submission"))
            .or_else(|| self.nested_eid("weldData"))
    }

    /// Webform eid, for webform events
    pub fn webform_eid(&self) -> Option<&str> {
        if self.action != WebhookAction::ForgeComplete {
            return None;
        }
        self.data_str(&["forgeEid", "webformEid", "forge_eid"])
            .or_else(|| self.nested_eid("forge"))
    }

    fn data_str(&self, keys: &[&str]) -> Option<&str> {
        let object = self.data.as_object()?;
        keys.iter().find_map(|key| object.get(*key).and_then(Value::as_str))
    }

    fn nested_eid(&self, key: &str) -> Option<&str> {
        self.data.get(key)?.get("eid")?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn webhook(action: &str, data: Value) -> Webhook {
        Webhook::from_value(
            json!({"action": action, "data": data, "timestamp": "2024-01-01T00:00:00Z"}),
            Some("abc"),
        )
        .unwrap()
    }

    #[test]
    fn test_signer_complete() {
        let payload =
            r#"{"action":"signerComplete","data":{"signerEid":"s1"},"timestamp":"2024-01-01T00:00:00Z"}"#;
        let hook = Webhook::parse(payload, Some("abc")).unwrap();

        assert!(hook.is_valid_with("abc").unwrap());
        assert!(hook.is_signer_complete());
        assert_eq!(hook.signer_eid(), Some("s1"));
        assert_eq!(hook.timestamp().unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(
            Webhook::parse("{not json", None),
            Err(WebhookError::Payload(_))
        ));
        assert!(matches!(
            Webhook::parse("[1, 2]", None),
            Err(WebhookError::Payload(_))
        ));
        assert!(matches!(
            Webhook::parse(r#"{"data": {}}"#, None),
            Err(WebhookError::Payload(_))
        ));
        assert!(matches!(
            Webhook::parse(r#"{"action": "weldComplete"}"#, None),
            Err(WebhookError::Payload(_))
        ));
    }

    #[test]
    fn test_token_checks() {
        let hook = webhook("webhookTest", json!({}));
        assert!(hook.is_valid_with("abc").unwrap());
        assert!(!hook.is_valid_with("abd").unwrap());
        assert!(!hook.is_valid_with("abcd").unwrap());
        assert!(hook.verify_with("abc").is_ok());
        assert!(matches!(
            hook.verify_with("nope"),
            Err(WebhookError::Verification(_))
        ));
    }

    #[test]
    fn test_missing_inbound_token_is_invalid() {
        let hook = Webhook::from_value(json!({"action": "webhookTest", "data": {}}), None).unwrap();
        assert!(!hook.is_valid_with("abc").unwrap());

        let hook =
            Webhook::from_value(json!({"action": "webhookTest", "data": {}}), Some("")).unwrap();
        assert!(hook.token().is_none());
        assert!(!hook.is_valid_with("abc").unwrap());
    }

    #[test]
    fn test_extractors_are_scoped_to_actions() {
        let hook = webhook(
            "signerUpdateStatus",
            json!({"signerEid": "s1", "signerStatus": "viewed", "etchPacketEid": "p1"}),
        );
        assert!(hook.is_signer_update());
        assert_eq!(hook.signer_status(), Some("viewed"));
        assert_eq!(hook.packet_eid(), Some("p1"));
        assert_eq!(hook.workflow_eid(), None);

        let hook = webhook(
            "forgeComplete",
            json!({
                "forge": {"eid": "f1"},
                "weld": {"eid": "w1"},
                "submissionEid": "sub1",
                "signerEid": "s9"
            }),
        );
        assert!(hook.is_webform_complete());
        assert_eq!(hook.webform_eid(), Some("f1"));
        assert_eq!(hook.workflow_eid(), Some("w1"));
        assert_eq!(hook.submission_eid(), Some("sub1"));
        assert_eq!(hook.signer_eid(), None);

        let hook = webhook("weldComplete", json!({"weldEid": "w1", "weldDataEid": "wd1"}));
        assert!(hook.is_workflow_complete());
        assert_eq!(hook.submission_eid(), Some("wd1"));
        assert_eq!(hook.webform_eid(), None);
    }

    #[test]
    fn test_action_predicates() {
        assert!(webhook("weldCreate", json!({})).is_workflow_created());
        assert!(webhook("etchPacketComplete", json!({})).is_signature_packet_complete());
        assert!(webhook("documentGroupCreate", json!({})).is_document_group_created());
        assert!(webhook("webhookTest", json!({})).is_test());
        assert!(!webhook("somethingNew", json!({})).is_signer_event());
        assert_eq!(
            webhook("somethingNew", json!({})).action(),
            &WebhookAction::Unknown("somethingNew".to_string())
        );
    }

    #[test]
    fn test_plain_data_is_not_encrypted() {
        let hook = webhook("signerComplete", json!({"signerEid": "s1"}));
        assert!(!hook.is_encrypted());
        // The key is never read for plain data.
        assert_eq!(
            hook.decrypt("/nonexistent/key.pem").unwrap(),
            json!({"signerEid": "s1"})
        );
    }

    #[test]
    fn test_non_rfc3339_timestamp_is_kept_raw() {
        let hook = Webhook::from_value(
            json!({"action": "webhookTest", "data": {}, "timestamp": 1704067200}),
            None,
        )
        .unwrap();
        assert_eq!(hook.timestamp_raw(), Some("1704067200"));
        assert!(hook.timestamp().is_none());
    }
}

//! Webhook actions

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Event that triggered a webhook
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WebhookAction {
    /// A workflow was created
    WeldCreate,
    /// A workflow was completed
    WeldComplete,
    /// A webform was completed
    ForgeComplete,
    /// A signer finished signing
    SignerComplete,
    /// A signer's status changed
    SignerUpdateStatus,
    /// Every signer of a packet finished
    EtchPacketComplete,
    /// A signed document group was created
    DocumentGroupCreate,
    /// Test delivery from the dashboard
    WebhookTest,
    /// Any action this library does not know yet
    Unknown(String),
}

impl WebhookAction {
    /// Parse from the wire name
    pub fn parse(s: &str) -> Self {
        match s {
            "weldCreate" => Self::WeldCreate,
            "weldComplete" => Self::WeldComplete,
            "forgeComplete" => Self::ForgeComplete,
            "signerComplete" => Self::SignerComplete,
            "signerUpdateStatus" => Self::SignerUpdateStatus,
            "etchPacketComplete" => Self::EtchPacketComplete,
            "documentGroupCreate" => Self::DocumentGroupCreate,
            "webhookTest" => Self::WebhookTest,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Get the wire name
    pub fn as_str(&self) -> &str {
        match self {
            Self::WeldCreate => "weldCreate",
            Self::WeldComplete => "weldComplete",
            Self::ForgeComplete => "forgeComplete",
            Self::SignerComplete => "signerComplete",
            Self::SignerUpdateStatus => "signerUpdateStatus",
            Self::EtchPacketComplete => "etchPacketComplete",
            Self::DocumentGroupCreate => "documentGroupCreate",
            Self::WebhookTest => "webhookTest",
            Self::Unknown(name) => name,
        }
    }

    /// Is a signer event
    pub fn is_signer_event(&self) -> bool {
        matches!(self, Self::SignerComplete | Self::SignerUpdateStatus)
    }

    /// Is a signature packet event
    pub fn is_packet_event(&self) -> bool {
        matches!(
            self,
            Self::SignerComplete
                | Self::SignerUpdateStatus
                | Self::EtchPacketComplete
                | Self::DocumentGroupCreate
        )
    }

    /// Is a workflow or webform event
    pub fn is_workflow_event(&self) -> bool {
        matches!(self, Self::WeldCreate | Self::WeldComplete | Self::ForgeComplete)
    }
}

impl fmt::Display for WebhookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for WebhookAction {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl Serialize for WebhookAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WebhookAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_actions() {
        for name in [
            "weldCreate",
            "weldComplete",
            "forgeComplete",
            "signerComplete",
            "signerUpdateStatus",
            "etchPacketComplete",
            "documentGroupCreate",
            "webhookTest",
        ] {
            let action = WebhookAction::parse(name);
            assert!(!matches!(action, WebhookAction::Unknown(_)), "{}", name);
            assert_eq!(action.as_str(), name);
        }
    }

    #[test]
    fn test_unknown_action_is_kept() {
        let action = WebhookAction::parse("somethingNew");
        assert_eq!(action, WebhookAction::Unknown("somethingNew".to_string()));
        assert_eq!(action.to_string(), "somethingNew");
    }

    #[test]
    fn test_categories() {
        assert!(WebhookAction::SignerUpdateStatus.is_signer_event());
        assert!(WebhookAction::SignerUpdateStatus.is_packet_event());
        assert!(!WebhookAction::EtchPacketComplete.is_signer_event());
        assert!(WebhookAction::ForgeComplete.is_workflow_event());
        assert!(!WebhookAction::WebhookTest.is_workflow_event());
    }

    #[test]
    fn test_serde() {
        let action: WebhookAction = serde_json::from_str("\"weldComplete\"").unwrap();
        assert_eq!(action, WebhookAction::WeldComplete);
        assert_eq!(serde_json::to_string(&action).unwrap(), "\"weldComplete\"");
    }
}

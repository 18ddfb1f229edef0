//! Signature packets and their signers.

use anvil_core::{Client, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::resource::{dig, found, graphql, graphql_mutation, items, require};
use crate::{queries, Attributes, Identifiable, Mutable, Reloadable, Resource};

/// Lifecycle of a signature packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketStatus {
    /// Not yet sent to signers.
    Draft,
    /// Sent, nobody has signed.
    Sent,
    /// Some signers have finished.
    PartialComplete,
    /// Every signer has finished.
    Complete,
}

impl PacketStatus {
    /// Get the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::PartialComplete => "partial_complete",
            Self::Complete => "complete",
        }
    }
}

impl FromStr for PacketStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            "partial_complete" | "partialcomplete" => Ok(Self::PartialComplete),
            "complete" | "completed" => Ok(Self::Complete),
            other => Err(Error::api(format!("Unknown packet status '{}'", other))),
        }
    }
}

impl fmt::Display for PacketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a single signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerStatus {
    /// Waiting for earlier signers.
    Initial,
    /// Asked to sign.
    Sent,
    /// Opened the documents.
    Viewed,
    /// Finished signing.
    Completed,
    /// Removed from the packet.
    Voided,
}

impl SignerStatus {
    /// Get the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Sent => "sent",
            Self::Viewed => "viewed",
            Self::Completed => "completed",
            Self::Voided => "voided",
        }
    }
}

impl FromStr for SignerStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "initial" => Ok(Self::Initial),
            "sent" => Ok(Self::Sent),
            "viewed" => Ok(Self::Viewed),
            "completed" | "complete" => Ok(Self::Completed),
            "voided" => Ok(Self::Voided),
            other => Err(Error::api(format!("Unknown signer status '{}'", other))),
        }
    }
}

impl fmt::Display for SignerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for [`SignaturePacket::create`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePacket {
    /// Packet name.
    pub name: String,
    /// Create without sending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_draft: Option<bool>,
    /// Test packets are watermarked and not legally binding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_test: Option<bool>,
    /// Subject of the signature request email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_email_subject: Option<String>,
    /// Body of the signature request email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_email_body: Option<String>,
    /// URL notified on packet events.
    #[serde(rename = "webhookURL", skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Signer definitions.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub signers: Vec<Value>,
    /// File definitions (templates or uploads).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<Value>,
}

impl CreatePacket {
    /// Start a packet definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create as a draft.
    pub fn draft(mut self, draft: bool) -> Self {
        self.is_draft = Some(draft);
        self
    }

    /// Create as a test packet.
    pub fn test(mut self, test: bool) -> Self {
        self.is_test = Some(test);
        self
    }

    /// Set the request email subject.
    pub fn email_subject(mut self, subject: impl Into<String>) -> Self {
        self.signature_email_subject = Some(subject.into());
        self
    }

    /// Set the request email body.
    pub fn email_body(mut self, body: impl Into<String>) -> Self {
        self.signature_email_body = Some(body.into());
        self
    }

    /// Set the webhook URL.
    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Add a signer.
    pub fn signer(mut self, signer: Value) -> Self {
        self.signers.push(signer);
        self
    }

    /// Add a file.
    pub fn file(mut self, file: Value) -> Self {
        self.files.push(file);
        self
    }
}

/// An envelope of documents and the parties who sign them.
#[derive(Debug, Clone)]
pub struct SignaturePacket {
    attributes: Attributes,
    client: Client,
}

impl SignaturePacket {
    /// Wrap attributes returned by the API.
    pub fn from_attributes(attributes: impl Into<Attributes>, client: Client) -> Self {
        Self {
            attributes: attributes.into(),
            client,
        }
    }

    /// Fetch a packet by eid.
    pub async fn find(client: &Client, eid: &str) -> Result<Self> {
        let data = graphql(client, queries::FIND_PACKET, json!({ "eid": eid })).await?;
        let packet = found(&data, &["etchPacket"], Self::NAME, eid)?;
        Ok(Self::from_attributes(packet, client.clone()))
    }

    /// List packets of the current user.
    pub async fn list(
        client: &Client,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Self>> {
        let data = graphql(
            client,
            queries::LIST_PACKETS,
            json!({ "limit": limit, "offset": offset }),
        )
        .await?;
        Ok(items(&data, &["currentUser", "etchPackets"])?
            .into_iter()
            .map(|packet| Self::from_attributes(packet, client.clone()))
            .collect())
    }

    /// Create a packet.
    pub async fn create(client: &Client, params: CreatePacket) -> Result<Self> {
        let variables = serde_json::to_value(&params)?;
        let data = graphql_mutation(client, queries::CREATE_PACKET, variables).await?;
        let packet = Self::from_attributes(require(&data, &["createEtchPacket"])?, client.clone());
        info!(eid = packet.eid().unwrap_or_default(), "Created signature packet");
        Ok(packet)
    }

    /// Update a packet, returning the updated packet.
    ///
    /// `changes` is an object of packet fields, e.g. `{"name": "New name"}`.
    pub async fn update(&self, changes: Value) -> Result<Self> {
        let eid = self.require_eid()?;
        let mut variables = match changes {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => return Err(Error::api("Packet changes must be an object")),
        };
        variables.insert("eid".to_string(), Value::String(eid.to_string()));

        let data =
            graphql_mutation(&self.client, queries::UPDATE_PACKET, Value::Object(variables)).await?;
        Ok(self.fresh(require(&data, &["updateEtchPacket"])?))
    }

    /// Send a draft packet to its signers.
    pub async fn send(&self) -> Result<Self> {
        let eid = self.require_eid()?;
        let data =
            graphql_mutation(&self.client, queries::SEND_PACKET, json!({ "eid": eid })).await?;
        let packet = self.fresh(require(&data, &["sendEtchPacket"])?);
        info!(eid, "Sent signature packet");
        Ok(packet)
    }

    /// Delete the packet.
    pub async fn delete(&self) -> Result<()> {
        let eid = self.require_eid()?;
        let data =
            graphql_mutation(&self.client, queries::DELETE_PACKET, json!({ "eid": eid })).await?;
        match require(&data, &["removeEtchPacket"])? {
            Value::Bool(false) => Err(Error::api(format!("Packet '{}' was not deleted", eid))),
            _ => {
                info!(eid, "Deleted signature packet");
                Ok(())
            }
        }
    }

    /// Void the packet, cancelling outstanding signatures.
    pub async fn void(&self, reason: Option<&str>) -> Result<Self> {
        let eid = self.require_eid()?;
        let data = graphql_mutation(
            &self.client,
            queries::VOID_PACKET,
            json!({ "eid": eid, "reason": reason }),
        )
        .await?;
        let packet = self.fresh(require(&data, &["voidEtchPacket"])?);
        info!(eid, "Voided signature packet");
        Ok(packet)
    }

    /// Skip a signer of this packet.
    pub async fn skip_signer(&self, signer_eid: &str) -> Result<Signer> {
        self.signer_handle(signer_eid).skip().await
    }

    /// Send a reminder to a signer of this packet.
    pub async fn notify_signer(&self, signer_eid: &str) -> Result<Signer> {
        self.signer_handle(signer_eid).notify().await
    }

    /// Expire outstanding signing links of a signer of this packet.
    pub async fn expire_tokens(&self, signer_eid: &str) -> Result<Signer> {
        self.signer_handle(signer_eid).expire_tokens().await
    }

    /// Get the client used by this packet.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Packet name.
    pub fn name(&self) -> Option<&str> {
        self.attributes.get_str("name")
    }

    /// Packet status, `None` when missing or unrecognized.
    pub fn status(&self) -> Option<PacketStatus> {
        self.attributes.get_str("status").and_then(|s| s.parse().ok())
    }

    /// Check for draft status.
    pub fn is_draft(&self) -> bool {
        self.status() == Some(PacketStatus::Draft)
    }

    /// Check for sent status.
    pub fn is_sent(&self) -> bool {
        self.status() == Some(PacketStatus::Sent)
    }

    /// Check whether signing is under way: sent or partially complete.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self.status(),
            Some(PacketStatus::Sent) | Some(PacketStatus::PartialComplete)
        )
    }

    /// Check for complete status.
    pub fn is_complete(&self) -> bool {
        self.status() == Some(PacketStatus::Complete)
    }

    /// Check whether this is a test packet.
    pub fn is_test(&self) -> bool {
        self.attributes.get_bool("is_test").unwrap_or(false)
    }

    /// Link to the packet in the Anvil dashboard.
    pub fn detail_url(&self) -> Option<&str> {
        self.attributes.get_str("detail_url")
    }

    /// Eid of the signed document group.
    pub fn document_group_eid(&self) -> Option<&str> {
        self.attributes
            .get("document_group")
            .and_then(|group| dig(group, &["eid"]))
            .and_then(Value::as_str)
    }

    /// Creation time.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.attributes.get_datetime("created_at")
    }

    /// Last update time.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.attributes.get_datetime("updated_at")
    }

    /// Completion time.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.attributes.get_datetime("completed_at")
    }

    /// Signers of this packet, in the order the API returned them.
    pub fn signers(&self) -> Vec<Signer> {
        let packet_eid = self.eid().map(str::to_string);
        self.attributes
            .get_array("signers")
            .map(|signers| {
                signers
                    .iter()
                    .map(|s| Signer::new(s.clone(), self.client.clone(), packet_eid.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Find a signer of this packet by eid.
    pub fn signer(&self, eid: &str) -> Option<Signer> {
        self.signers().into_iter().find(|s| s.eid() == Some(eid))
    }

    fn signer_handle(&self, signer_eid: &str) -> Signer {
        self.signer(signer_eid).unwrap_or_else(|| {
            Signer::new(
                json!({ "eid": signer_eid }),
                self.client.clone(),
                self.eid().map(str::to_string),
            )
        })
    }

    fn fresh(&self, attributes: Value) -> Self {
        Self::from_attributes(attributes, self.client.clone())
    }
}

impl Resource for SignaturePacket {
    const NAME: &'static str = "Signature packet";
    const FIELDS: &'static [&'static str] = &[
        "eid",
        "name",
        "status",
        "is_test",
        "created_at",
        "updated_at",
        "completed_at",
        "detail_url",
        "document_group",
        "signers",
    ];

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

impl Identifiable for SignaturePacket {}

impl Mutable for SignaturePacket {
    /// Only drafts accept changes.
    fn is_mutable(&self) -> bool {
        self.is_draft()
    }
}

#[async_trait]
impl Reloadable for SignaturePacket {
    async fn reload(&mut self) -> Result<()> {
        let eid = self.require_eid()?.to_string();
        let fresh = Self::find(&self.client, &eid).await?;
        self.attributes = fresh.attributes;
        Ok(())
    }
}

/// A party required to sign within a packet.
///
/// Holds the eid of its packet rather than the packet itself; use
/// [`Signer::packet`] to fetch it.
#[derive(Debug, Clone)]
pub struct Signer {
    attributes: Attributes,
    client: Client,
    packet_eid: Option<String>,
}

impl Signer {
    /// Wrap attributes returned by the API.
    pub fn new(
        attributes: impl Into<Attributes>,
        client: Client,
        packet_eid: Option<String>,
    ) -> Self {
        Self {
            attributes: attributes.into(),
            client,
            packet_eid,
        }
    }

    /// Generate an embedded signing URL for this signer.
    pub async fn sign_url(&self, client_user_id: &str) -> Result<String> {
        let eid = self.require_eid()?;
        let data = graphql_mutation(
            &self.client,
            queries::SIGN_URL,
            json!({ "signerEid": eid, "clientUserId": client_user_id }),
        )
        .await?;
        match require(&data, &["generateEtchSignURL"])? {
            Value::String(url) => Ok(url),
            other => Err(Error::api(format!("Unexpected signing URL value: {}", other))),
        }
    }

    /// Skip this signer.
    pub async fn skip(&self) -> Result<Self> {
        self.signer_mutation(queries::SKIP_SIGNER, "skipSigner").await
    }

    /// Send this signer a reminder.
    pub async fn notify(&self) -> Result<Self> {
        self.signer_mutation(queries::NOTIFY_SIGNER, "notifySigner").await
    }

    /// Expire this signer's outstanding signing links.
    pub async fn expire_tokens(&self) -> Result<Self> {
        self.signer_mutation(queries::EXPIRE_SIGNER_TOKENS, "expireSignerTokens")
            .await
    }

    /// Fetch the packet this signer belongs to.
    pub async fn packet(&self) -> Result<SignaturePacket> {
        let eid = self
            .packet_eid
            .as_deref()
            .ok_or_else(|| Error::api("Signer is not associated with a packet"))?;
        SignaturePacket::find(&self.client, eid).await
    }

    /// Eid of the packet this signer belongs to.
    pub fn packet_eid(&self) -> Option<&str> {
        self.packet_eid.as_deref()
    }

    /// Signer name.
    pub fn name(&self) -> Option<&str> {
        self.attributes.get_str("name")
    }

    /// Signer email.
    pub fn email(&self) -> Option<&str> {
        self.attributes.get_str("email")
    }

    /// Caller-chosen id for this signer.
    pub fn alias_id(&self) -> Option<&str> {
        self.attributes.get_str("alias_id")
    }

    /// Position in the signing order.
    pub fn routing_order(&self) -> Option<i64> {
        self.attributes.get_i64("routing_order")
    }

    /// Signer status, `None` when missing or unrecognized.
    pub fn status(&self) -> Option<SignerStatus> {
        self.attributes.get_str("status").and_then(|s| s.parse().ok())
    }

    /// Check whether this signer has finished.
    pub fn is_complete(&self) -> bool {
        self.status() == Some(SignerStatus::Completed)
    }

    /// Completion time.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.attributes.get_datetime("completed_at")
    }

    async fn signer_mutation(&self, document: &str, field: &str) -> Result<Self> {
        let eid = self.require_eid()?;
        let data = graphql_mutation(&self.client, document, json!({ "eid": eid })).await?;
        let attributes = require(&data, &[field])?;
        info!(eid, operation = field, "Updated signer");
        Ok(Self::new(attributes, self.client.clone(), self.packet_eid.clone()))
    }
}

impl Resource for Signer {
    const NAME: &'static str = "Signer";
    const FIELDS: &'static [&'static str] = &[
        "eid",
        "alias_id",
        "routing_order",
        "name",
        "email",
        "status",
        "sign_action_type",
        "completed_at",
    ];

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

impl Identifiable for Signer {}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_core::Configuration;

    fn client() -> Client {
        Client::new(Configuration::builder().api_key("k").build().unwrap()).unwrap()
    }

    fn packet(status: &str) -> SignaturePacket {
        SignaturePacket::from_attributes(
            json!({
                "eid": "p1",
                "status": status,
                "documentGroup": {"eid": "dg1"},
                "signers": [
                    {"eid": "s1", "name": "Ada", "status": "completed", "routingOrder": 1},
                    {"eid": "s2", "name": "Bob", "status": "sent", "routingOrder": 2}
                ]
            }),
            client(),
        )
    }

    #[test]
    fn test_partial_complete_is_in_progress() {
        let packet = packet("partial_complete");
        assert!(packet.is_in_progress());
        assert!(!packet.is_complete());
        assert!(!packet.is_draft());
        assert!(!packet.is_mutable());
    }

    #[test]
    fn test_status_predicates() {
        assert!(packet("draft").is_draft());
        assert!(packet("draft").is_mutable());
        assert!(packet("sent").is_in_progress());
        assert!(packet("sent").is_sent());
        assert!(packet("complete").is_complete());
        assert!(!packet("complete").is_in_progress());
        assert_eq!(packet("mystery").status(), None);
    }

    #[test]
    fn test_signers_keep_packet_reference() {
        let packet = packet("sent");
        let signers = packet.signers();
        assert_eq!(signers.len(), 2);
        assert!(signers.iter().all(|s| s.packet_eid() == Some("p1")));

        let ada = packet.signer("s1").unwrap();
        assert!(ada.is_complete());
        assert_eq!(ada.routing_order(), Some(1));
        assert_eq!(packet.signer("s2").unwrap().status(), Some(SignerStatus::Sent));
        assert!(packet.signer("nope").is_none());
        assert_eq!(packet.document_group_eid(), Some("dg1"));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            "partial-complete".parse::<PacketStatus>().unwrap(),
            PacketStatus::PartialComplete
        );
        assert_eq!("Completed".parse::<PacketStatus>().unwrap(), PacketStatus::Complete);
        assert!("unknown".parse::<PacketStatus>().is_err());
        assert_eq!("VIEWED".parse::<SignerStatus>().unwrap(), SignerStatus::Viewed);
    }

    #[test]
    fn test_create_packet_variables() {
        let params = CreatePacket::new("NDA")
            .draft(true)
            .webhook_url("https://example.com/hook")
            .signer(json!({"id": "signer1", "name": "Ada", "email": "ada@example.com"}));
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["name"], "NDA");
        assert_eq!(value["isDraft"], true);
        assert_eq!(value["webhookURL"], "https://example.com/hook");
        assert_eq!(value["signers"][0]["id"], "signer1");
        assert!(value.get("files").is_none());
        assert!(value.get("isTest").is_none());
    }

    #[test]
    fn test_extra_attributes() {
        let packet =
            SignaturePacket::from_attributes(json!({"eid": "p1", "newField": 1}), client());
        let extra = packet.extra();
        assert_eq!(extra.len(), 1);
        assert_eq!(extra["new_field"], 1);
    }
}

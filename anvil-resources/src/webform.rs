//! Webforms (forges) and their submissions.

use anvil_core::{Client, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::info;

use crate::resource::{dig, found, graphql, graphql_mutation, items, require};
use crate::{queries, Attributes, Identifiable, Mutable, Reloadable, Resource, SubmissionStatus};

/// A hosted data collection form.
#[derive(Debug, Clone)]
pub struct Webform {
    attributes: Attributes,
    client: Client,
}

impl Webform {
    /// Wrap attributes returned by the API.
    pub fn from_attributes(attributes: impl Into<Attributes>, client: Client) -> Self {
        Self {
            attributes: attributes.into(),
            client,
        }
    }

    /// Fetch a webform by eid.
    pub async fn find(client: &Client, eid: &str) -> Result<Self> {
        let data = graphql(client, queries::FIND_WEBFORM, json!({ "eid": eid })).await?;
        let webform = found(&data, &["forge"], Self::NAME, eid)?;
        Ok(Self::from_attributes(webform, client.clone()))
    }

    /// Submit `data`, creating a new submission.
    pub async fn submit(&self, data: Value) -> Result<WebformSubmission> {
        let eid = self.require_eid()?;
        let result = graphql_mutation(
            &self.client,
            queries::SUBMIT_WEBFORM,
            json!({ "forgeEid": eid, "payload": data }),
        )
        .await?;
        let submission = WebformSubmission::from_attributes(
            require(&result, &["forgeSubmit"])?,
            self.client.clone(),
        );
        info!(
            webform = eid,
            submission = submission.eid().unwrap_or_default(),
            "Submitted webform"
        );
        Ok(submission)
    }

    /// Submissions of this webform.
    pub async fn submissions(&self) -> Result<Vec<WebformSubmission>> {
        let eid = self.require_eid()?;
        let data = graphql(
            &self.client,
            queries::WEBFORM_SUBMISSIONS,
            json!({ "eid": eid }),
        )
        .await?;
        Ok(items(&data, &["forge", "submissions"])?
            .into_iter()
            .map(|submission| WebformSubmission::from_attributes(submission, self.client.clone()))
            .collect())
    }

    /// Get the client used by this webform.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Webform name.
    pub fn name(&self) -> Option<&str> {
        self.attributes.get_str("name")
    }

    /// URL slug.
    pub fn slug(&self) -> Option<&str> {
        self.attributes.get_str("slug")
    }

    /// Eid of the workflow this webform is a step of.
    pub fn workflow_eid(&self) -> Option<&str> {
        self.attributes
            .get("weld")
            .and_then(|w| dig(w, &["eid"]))
            .and_then(Value::as_str)
    }
}

impl Resource for Webform {
    const NAME: &'static str = "Webform";
    const FIELDS: &'static [&'static str] =
        &["eid", "name", "slug", "created_at", "updated_at", "weld"];

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

impl Identifiable for Webform {}

#[async_trait]
impl Reloadable for Webform {
    async fn reload(&mut self) -> Result<()> {
        let eid = self.require_eid()?.to_string();
        let fresh = Self::find(&self.client, &eid).await?;
        self.attributes = fresh.attributes;
        Ok(())
    }
}

/// Data submitted to a webform.
#[derive(Debug, Clone)]
pub struct WebformSubmission {
    attributes: Attributes,
    client: Client,
}

impl WebformSubmission {
    /// Wrap attributes returned by the API.
    pub fn from_attributes(attributes: impl Into<Attributes>, client: Client) -> Self {
        Self {
            attributes: attributes.into(),
            client,
        }
    }

    /// Fetch a submission by eid.
    pub async fn find(client: &Client, eid: &str) -> Result<Self> {
        let data = graphql(client, queries::FIND_WEBFORM_SUBMISSION, json!({ "eid": eid })).await?;
        let submission = found(&data, &["submission"], Self::NAME, eid)?;
        Ok(Self::from_attributes(submission, client.clone()))
    }

    /// Submitted data.
    pub fn payload(&self) -> Option<&Value> {
        self.attributes.get("payload")
    }

    /// Status, `None` when missing or unrecognized.
    pub fn status(&self) -> Option<SubmissionStatus> {
        self.attributes.get_str("status").and_then(|s| s.parse().ok())
    }

    /// Check whether the submission is finished.
    pub fn is_complete(&self) -> bool {
        self.status() == Some(SubmissionStatus::Complete)
    }

    /// Eid of the webform this submission belongs to.
    pub fn webform_eid(&self) -> Option<&str> {
        self.attributes
            .get("forge")
            .and_then(|f| dig(f, &["eid"]))
            .and_then(Value::as_str)
    }

    /// Eid of the workflow submission this belongs to.
    pub fn workflow_submission_eid(&self) -> Option<&str> {
        self.attributes
            .get("weld_data")
            .and_then(|w| dig(w, &["eid"]))
            .and_then(Value::as_str)
    }

    /// Creation time.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.attributes.get_datetime("created_at")
    }
}

impl Resource for WebformSubmission {
    const NAME: &'static str = "Webform submission";
    const FIELDS: &'static [&'static str] = &[
        "eid",
        "status",
        "payload",
        "created_at",
        "updated_at",
        "forge",
        "weld_data",
    ];

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

impl Identifiable for WebformSubmission {}

impl Mutable for WebformSubmission {
    fn is_mutable(&self) -> bool {
        !self.is_complete()
    }
}

#[async_trait]
impl Reloadable for WebformSubmission {
    async fn reload(&mut self) -> Result<()> {
        let eid = self.require_eid()?.to_string();
        let fresh = Self::find(&self.client, &eid).await?;
        self.attributes = fresh.attributes;
        Ok(())
    }
}

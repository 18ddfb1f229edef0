//! Workflows (welds) and their submissions.

use anvil_core::{Client, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::info;

use crate::resource::{dig, found, graphql, graphql_mutation, items, require};
use crate::{queries, Attributes, Identifiable, Mutable, Reloadable, Resource};

/// Progress of a workflow submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    /// Created, no data yet.
    Pending,
    /// Some steps are done.
    InProgress,
    /// Every step is done.
    Complete,
}

impl FromStr for SubmissionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pending" | "draft" => Ok(Self::Pending),
            "in_progress" | "inprogress" | "started" => Ok(Self::InProgress),
            "complete" | "completed" => Ok(Self::Complete),
            other => Err(Error::api(format!("Unknown submission status '{}'", other))),
        }
    }
}

/// A multi-step process chaining webforms and documents.
#[derive(Debug, Clone)]
pub struct Workflow {
    attributes: Attributes,
    client: Client,
}

impl Workflow {
    /// Wrap attributes returned by the API.
    pub fn from_attributes(attributes: impl Into<Attributes>, client: Client) -> Self {
        Self {
            attributes: attributes.into(),
            client,
        }
    }

    /// Fetch a workflow by eid.
    pub async fn find(client: &Client, eid: &str) -> Result<Self> {
        let data = graphql(client, queries::FIND_WORKFLOW, json!({ "eid": eid })).await?;
        let workflow = found(&data, &["weld"], Self::NAME, eid)?;
        Ok(Self::from_attributes(workflow, client.clone()))
    }

    /// List workflows of the current user.
    pub async fn list(client: &Client) -> Result<Vec<Self>> {
        let data = graphql(client, queries::LIST_WORKFLOWS, json!({})).await?;
        Ok(items(&data, &["currentUser", "welds"])?
            .into_iter()
            .map(|workflow| Self::from_attributes(workflow, client.clone()))
            .collect())
    }

    /// Start a new submission by submitting `data` to the first step.
    pub async fn start(&self, data: Value) -> Result<WorkflowSubmission> {
        let forge_eid = self
            .first_step_eid()
            .ok_or_else(|| Error::api("Workflow has no webform steps to start"))?;
        let result = graphql_mutation(
            &self.client,
            queries::START_WORKFLOW,
            json!({ "forgeEid": forge_eid, "payload": data }),
        )
        .await?;
        let submission = WorkflowSubmission::from_attributes(
            require(&result, &["forgeSubmit", "weldData"])?,
            self.client.clone(),
        );
        info!(
            workflow = self.eid().unwrap_or_default(),
            submission = submission.eid().unwrap_or_default(),
            "Started workflow"
        );
        Ok(submission)
    }

    /// Submissions of this workflow.
    pub async fn submissions(&self) -> Result<Vec<WorkflowSubmission>> {
        let eid = self.require_eid()?;
        let data = graphql(
            &self.client,
            queries::WORKFLOW_SUBMISSIONS,
            json!({ "eid": eid }),
        )
        .await?;
        Ok(items(&data, &["weld", "weldDatas"])?
            .into_iter()
            .map(|submission| WorkflowSubmission::from_attributes(submission, self.client.clone()))
            .collect())
    }

    /// Get the client used by this workflow.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Workflow name.
    pub fn name(&self) -> Option<&str> {
        self.attributes.get_str("name")
    }

    /// URL slug.
    pub fn slug(&self) -> Option<&str> {
        self.attributes.get_str("slug")
    }

    /// Eids of the webform steps, in order.
    pub fn step_eids(&self) -> Vec<&str> {
        self.attributes
            .get_array("forges")
            .map(|forges| {
                forges
                    .iter()
                    .filter_map(|f| dig(f, &["eid"]).and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Creation time.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.attributes.get_datetime("created_at")
    }

    fn first_step_eid(&self) -> Option<&str> {
        self.step_eids().into_iter().next()
    }
}

impl Resource for Workflow {
    const NAME: &'static str = "Workflow";
    const FIELDS: &'static [&'static str] =
        &["eid", "name", "slug", "created_at", "updated_at", "forges"];

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

impl Identifiable for Workflow {}

#[async_trait]
impl Reloadable for Workflow {
    async fn reload(&mut self) -> Result<()> {
        let eid = self.require_eid()?.to_string();
        let fresh = Self::find(&self.client, &eid).await?;
        self.attributes = fresh.attributes;
        Ok(())
    }
}

/// One run through a workflow.
#[derive(Debug, Clone)]
pub struct WorkflowSubmission {
    attributes: Attributes,
    client: Client,
}

impl WorkflowSubmission {
    /// Wrap attributes returned by the API.
    pub fn from_attributes(attributes: impl Into<Attributes>, client: Client) -> Self {
        Self {
            attributes: attributes.into(),
            client,
        }
    }

    /// Fetch a submission by eid.
    pub async fn find(client: &Client, eid: &str) -> Result<Self> {
        let data = graphql(client, queries::FIND_WORKFLOW_SUBMISSION, json!({ "eid": eid })).await?;
        let submission = found(&data, &["weldData"], Self::NAME, eid)?;
        Ok(Self::from_attributes(submission, client.clone()))
    }

    /// Submit `data` to the step `forge_eid`, returning the updated submission.
    pub async fn continue_with(&self, forge_eid: &str, data: Value) -> Result<Self> {
        let eid = self.require_eid()?;
        let result = graphql_mutation(
            &self.client,
            queries::CONTINUE_WORKFLOW,
            json!({ "forgeEid": forge_eid, "weldDataEid": eid, "payload": data }),
        )
        .await?;
        let submission = Self::from_attributes(
            require(&result, &["forgeSubmit", "weldData"])?,
            self.client.clone(),
        );
        info!(submission = eid, step = forge_eid, "Continued workflow");
        Ok(submission)
    }

    /// Status, `None` when missing or unrecognized.
    pub fn status(&self) -> Option<SubmissionStatus> {
        self.attributes.get_str("status").and_then(|s| s.parse().ok())
    }

    /// Check whether every step is done.
    pub fn is_complete(&self) -> bool {
        self.status() == Some(SubmissionStatus::Complete)
    }

    /// Check whether some steps are done.
    pub fn is_in_progress(&self) -> bool {
        self.status() == Some(SubmissionStatus::InProgress)
    }

    /// Eid of the workflow this submission belongs to.
    pub fn workflow_eid(&self) -> Option<&str> {
        self.attributes
            .get("weld")
            .and_then(|w| dig(w, &["eid"]))
            .and_then(Value::as_str)
    }

    /// Display title.
    pub fn display_title(&self) -> Option<&str> {
        self.attributes.get_str("display_title")
    }

    /// Last update time.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.attributes.get_datetime("updated_at")
    }
}

impl Resource for WorkflowSubmission {
    const NAME: &'static str = "Workflow submission";
    const FIELDS: &'static [&'static str] = &[
        "eid",
        "status",
        "display_title",
        "created_at",
        "updated_at",
        "weld",
    ];

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

impl Identifiable for WorkflowSubmission {}

impl Mutable for WorkflowSubmission {
    fn is_mutable(&self) -> bool {
        !self.is_complete()
    }
}

#[async_trait]
impl Reloadable for WorkflowSubmission {
    async fn reload(&mut self) -> Result<()> {
        let eid = self.require_eid()?.to_string();
        let fresh = Self::find(&self.client, &eid).await?;
        self.attributes = fresh.attributes;
        Ok(())
    }
}

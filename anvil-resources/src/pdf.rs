//! Filled and generated PDF documents.

use anvil_core::{Client, Error, ErrorDetail, Response, Result};
use base64::Engine;
use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::{Attributes, Resource};

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Source format for [`Pdf::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerateType {
    /// HTML and CSS.
    Html,
    /// Markdown fields.
    Markdown,
}

impl GenerateType {
    /// Get the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "markdown",
        }
    }
}

impl fmt::Display for GenerateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional document settings for fill and generate requests.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfOptions {
    /// Document title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Font size for filled fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    /// Text color for filled fields, such as `#333333`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    /// Page settings for generated documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<Value>,
}

impl PdfOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the font size.
    pub fn font_size(mut self, size: u32) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Set the text color.
    pub fn text_color(mut self, color: impl Into<String>) -> Self {
        self.text_color = Some(color.into());
        self
    }

    /// Set page settings (margins, size).
    pub fn page(mut self, page: Value) -> Self {
        self.page = Some(page);
        self
    }

    fn into_body(self, extra: Map<String, Value>) -> Result<Value> {
        let mut body = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        body.extend(extra);
        Ok(Value::Object(body))
    }
}

/// A PDF document produced by the API, or wrapped from local bytes.
#[derive(Debug, Clone, Default)]
pub struct Pdf {
    attributes: Attributes,
    content: Option<Bytes>,
}

impl Pdf {
    /// Fill a PDF template with data.
    pub async fn fill(
        client: &Client,
        template_id: &str,
        data: Value,
        options: PdfOptions,
    ) -> Result<Self> {
        let mut extra = Map::new();
        extra.insert("data".to_string(), data);
        let body = options.into_body(extra)?;

        debug!(template_id, "Filling PDF");
        let response = client
            .post(format!("/fill/{}.pdf", template_id))
            .json(&body)
            .send()
            .await?;

        let mut pdf = Self::from_response(response)?;
        pdf.attributes.set("template_id", template_id);
        info!(template_id, size = pdf.size(), "Filled PDF");
        Ok(pdf)
    }

    /// Generate a PDF from HTML or Markdown.
    pub async fn generate(
        client: &Client,
        kind: GenerateType,
        data: Value,
        options: PdfOptions,
    ) -> Result<Self> {
        let mut extra = Map::new();
        extra.insert("type".to_string(), Value::String(kind.as_str().to_string()));
        extra.insert("data".to_string(), data);
        let body = options.into_body(extra)?;

        debug!(kind = %kind, "Generating PDF");
        let response = client.post("/generate-pdf").json(&body).send().await?;

        let mut pdf = Self::from_response(response)?;
        pdf.attributes.set("type", kind.as_str());
        info!(kind = %kind, size = pdf.size(), "Generated PDF");
        Ok(pdf)
    }

    /// Wrap a binary API response.
    ///
    /// Anything other than a binary document is an error, even with a 2xx
    /// status.
    pub fn from_response(response: Response) -> Result<Self> {
        if !response.is_binary() {
            let content_type = response.content_type().unwrap_or("none").to_string();
            return Err(Error::Api {
                message: format!(
                    "Expected a binary PDF response but received content type '{}'",
                    content_type
                ),
                status: Some(response.status().as_u16()),
                errors: response
                    .parsed()
                    .map(|p| vec![ErrorDetail::from_value(p)])
                    .unwrap_or_default(),
            });
        }

        let mut attributes = Attributes::new();
        if let Some(content_type) = response.content_type() {
            attributes.set("content_type", content_type);
        }
        Ok(Self {
            attributes,
            content: Some(response.into_body()),
        })
    }

    /// Wrap local bytes.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            attributes: Attributes::new(),
            content: Some(bytes.into()),
        }
    }

    /// Create a PDF from attributes alone, without content.
    pub fn from_attributes(attributes: impl Into<Attributes>) -> Self {
        Self {
            attributes: attributes.into(),
            content: None,
        }
    }

    /// Get the raw content.
    pub fn bytes(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    /// Check whether there is content.
    pub fn has_content(&self) -> bool {
        self.content.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Template the document was filled from.
    pub fn template_id(&self) -> Option<&str> {
        self.attributes.get_str("template_id")
    }

    /// Write the content to `path`.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = self
            .content
            .as_ref()
            .ok_or_else(|| Error::File("No PDF content to save".to_string()))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| Error::File(format!("Failed to write {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), size = content.len(), "Saved PDF");
        Ok(())
    }

    /// Base64 encoding of the content, or `None` without content.
    pub fn to_base64(&self) -> Option<String> {
        self.content
            .as_ref()
            .map(|c| base64::engine::general_purpose::STANDARD.encode(c))
    }

    /// Content length in bytes.
    pub fn size(&self) -> usize {
        self.content.as_ref().map_or(0, Bytes::len)
    }

    /// Content length with 1024-based units, e.g. `1.50 KB`.
    pub fn size_human(&self) -> String {
        human_size(self.size())
    }
}

impl Resource for Pdf {
    const NAME: &'static str = "PDF";
    const FIELDS: &'static [&'static str] = &["template_id", "type", "content_type"];

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// Format a byte count with two decimals and B/KB/MB/GB units.
pub fn human_size(bytes: usize) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

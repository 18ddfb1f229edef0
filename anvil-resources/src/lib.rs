//! # Anvil Resources
//!
//! Typed domain objects over the Anvil API: PDFs, signature packets and
//! signers, workflows and webforms with their submissions.
//!
//! Every resource wraps a normalized [`Attributes`] map. Fields the library
//! does not model stay readable through [`Resource::get`], so new API fields
//! never break deserialization.
//!
//! Mutating calls (`update`, `send`, `void`, `skip`, `submit`, ...) return a
//! fresh instance built from the server response and leave the receiver
//! untouched. [`Reloadable::reload`] is the only call that refreshes an
//! instance in place.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anvil_core::{Client, Configuration};
//! use anvil_resources::{Pdf, PdfOptions, SignaturePacket};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(Configuration::builder().api_key("my-api-key").build()?)?;
//!
//!     let pdf = Pdf::fill(
//!         &client,
//!         "template-eid",
//!         json!({"name": "Jane Doe"}),
//!         PdfOptions::new().title("Agreement"),
//!     )
//!     .await?;
//!     pdf.save("agreement.pdf").await?;
//!
//!     let packet = SignaturePacket::find(&client, "packet-eid").await?;
//!     if packet.is_draft() {
//!         let sent = packet.send().await?;
//!         println!("{:?}", sent.status());
//!     }
//!     Ok(())
//! }
//! ```

mod attributes;
mod pdf;
mod queries;
mod resource;
mod signature;
mod webform;
mod workflow;

pub use attributes::{normalize_key, normalize_value, Attributes};
pub use pdf::{human_size, GenerateType, Pdf, PdfOptions};
pub use resource::{Identifiable, Mutable, Reloadable, Resource};
pub use signature::{CreatePacket, PacketStatus, SignaturePacket, Signer, SignerStatus};
pub use webform::{Webform, WebformSubmission};
pub use workflow::{SubmissionStatus, Workflow, WorkflowSubmission};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::pdf::{GenerateType, Pdf, PdfOptions};
    pub use crate::resource::{Identifiable, Mutable, Reloadable, Resource};
    pub use crate::signature::{SignaturePacket, Signer};
    pub use crate::webform::{Webform, WebformSubmission};
    pub use crate::workflow::{Workflow, WorkflowSubmission};
}

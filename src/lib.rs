// Anvil - A client for the Anvil document automation API
//
// This library bundles the transport, the typed resources and webhook
// verification behind one dependency.

// Re-export core functionality
pub use anvil_core::*;

// JSON values are the payload type throughout the API
pub use serde_json::{json, Value};

// Re-export optional crates
#[cfg(feature = "resources")]
pub use anvil_resources;

#[cfg(feature = "resources")]
pub use anvil_resources::{
    Attributes, CreatePacket, GenerateType, Identifiable, Mutable, PacketStatus, Pdf, PdfOptions,
    Reloadable, Resource, SignaturePacket, Signer, SignerStatus, SubmissionStatus, Webform,
    WebformSubmission, Workflow, WorkflowSubmission,
};

#[cfg(feature = "webhooks")]
pub use anvil_webhooks;

#[cfg(feature = "webhooks")]
pub use anvil_webhooks::{Webhook, WebhookAction, WebhookError};

// Prelude for common imports
pub mod prelude {
    pub use anvil_core::prelude::*;
    pub use serde_json::{json, Value};

    #[cfg(feature = "resources")]
    pub use anvil_resources::prelude::*;

    #[cfg(feature = "webhooks")]
    pub use anvil_webhooks::prelude::{Webhook, WebhookAction, WebhookError};
}

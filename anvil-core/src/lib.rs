//! # Anvil Core
//!
//! Transport layer for the Anvil document automation API: configuration,
//! an authenticated REST and GraphQL client, response classification, and
//! retry on rate limiting.
//!
//! ## Features
//!
//! - **Basic Auth**: The API key is sent as the username on every request
//! - **Rate Limit Retry**: HTTP 429 and connection failures are retried with
//!   exponential backoff, honoring `Retry-After`
//! - **Typed Errors**: Every non-2xx status maps to a distinct [`Error`] variant
//! - **GraphQL**: Query and mutation builders that fail on a non-empty `errors` array
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anvil_core::{Client, Configuration};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Configuration::builder().api_key("my-api-key").build()?;
//!     let client = Client::new(config)?;
//!
//!     let data = client
//!         .query("query { currentUser { eid name } }")
//!         .send()
//!         .await?;
//!
//!     println!("{}", data["currentUser"]["name"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Per-Tenant Keys
//!
//! ```rust,no_run
//! use anvil_core::Client;
//!
//! # async fn run() -> anvil_core::Result<()> {
//! let client = Client::shared()?;
//! let response = client
//!     .post("/fill/template-eid.pdf")
//!     .api_key("tenant-api-key")
//!     .json(&serde_json::json!({"data": {"name": "Jane"}}))
//!     .send()
//!     .await?;
//! assert!(response.is_binary());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
pub mod error;
mod global;
mod graphql;
mod rate_limiter;
mod request;
mod response;

pub use client::Client;
pub use config::{
    Configuration, ConfigurationBuilder, Environment, API_KEY_ENV, DEFAULT_BASE_URL,
    DEFAULT_GRAPHQL_URL, ENVIRONMENT_ENV, WEBHOOK_TOKEN_ENV,
};
pub use error::{Error, ErrorDetail, Result};
pub use global::{configuration, configure, reset};
pub use graphql::{GraphQLRequest, MutationBuilder, QueryBuilder};
pub use rate_limiter::{RateLimiter, RetryableResponse};
pub use request::RequestBuilder;
pub use response::{headers, Response, MAX_RETRY_AFTER};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::client::Client;
    pub use crate::config::{Configuration, Environment};
    pub use crate::error::{Error, Result};
    pub use crate::response::Response;
}

//! Shared resource contracts.

use anvil_core::{Client, Error, ErrorDetail, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::Attributes;

/// A domain object backed by API attributes.
pub trait Resource {
    /// Human readable resource name used in error messages.
    const NAME: &'static str;

    /// Normalized keys with typed accessors.
    const FIELDS: &'static [&'static str];

    /// Get the backing attributes.
    fn attributes(&self) -> &Attributes;

    /// Get a single attribute. Unknown keys return `None`.
    fn get(&self, key: &str) -> Option<&Value> {
        self.attributes().get(key)
    }

    /// Attributes not modelled by a typed accessor.
    fn extra(&self) -> Map<String, Value> {
        self.attributes().unknown(Self::FIELDS)
    }
}

/// A resource with a remote identifier.
pub trait Identifiable: Resource {
    /// The remote identifier.
    fn eid(&self) -> Option<&str> {
        self.attributes().get_str("eid")
    }

    /// The remote identifier, or an error for locally built instances.
    fn require_eid(&self) -> Result<&str> {
        self.eid().ok_or_else(|| {
            Error::api(format!("{} has no eid; it was not loaded from the API", Self::NAME))
        })
    }
}

/// A resource that can refresh itself from the API.
#[async_trait]
pub trait Reloadable: Identifiable + Send {
    /// Re-fetch and replace the backing attributes in place.
    async fn reload(&mut self) -> Result<()>;
}

/// A resource whose remote state decides whether it accepts changes.
pub trait Mutable: Identifiable {
    /// Check whether update-style calls are expected to succeed.
    fn is_mutable(&self) -> bool;
}

/// Walk a path of keys, returning `None` on a missing or null step.
pub(crate) fn dig<'a>(data: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(data, |value, key| value.get(*key))
        .filter(|value| !value.is_null())
}

/// Take the value at `path` out of a mutation result.
///
/// A missing field means the server did not perform the operation; the whole
/// payload is carried in the error.
pub(crate) fn require(data: &Value, path: &[&str]) -> Result<Value> {
    dig(data, path).cloned().ok_or_else(|| Error::Api {
        message: format!("Unexpected response: missing '{}'", path.join(".")),
        status: None,
        errors: vec![ErrorDetail::from_value(data)],
    })
}

/// Take the value at `path` out of a lookup result, or fail with not found.
pub(crate) fn found(data: &Value, path: &[&str], what: &str, eid: &str) -> Result<Value> {
    dig(data, path)
        .cloned()
        .ok_or_else(|| Error::not_found(format!("{} '{}' not found", what, eid)))
}

/// Take the list at `path`, accepting both bare arrays and `{items: [...]}` pages.
pub(crate) fn items(data: &Value, path: &[&str]) -> Result<Vec<Value>> {
    let value = require(data, path)?;
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(Error::Api {
                message: format!("Unexpected response: '{}' is not a list", path.join(".")),
                status: None,
                errors: vec![ErrorDetail::from_value(data)],
            }),
        },
        _ => Err(Error::Api {
            message: format!("Unexpected response: '{}' is not a list", path.join(".")),
            status: None,
            errors: vec![ErrorDetail::from_value(data)],
        }),
    }
}

/// Run a GraphQL query through `client` and return its `data` object.
pub(crate) async fn graphql(client: &Client, document: &str, variables: Value) -> Result<Value> {
    client.query(document).variables(variables).send().await
}

/// Run a GraphQL mutation through `client` and return its `data` object.
pub(crate) async fn graphql_mutation(
    client: &Client,
    document: &str,
    variables: Value,
) -> Result<Value> {
    client.mutation(document).variables(variables).send().await
}

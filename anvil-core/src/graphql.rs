//! GraphQL request builders.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Client, Error, Response, Result};

/// GraphQL request payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    /// The GraphQL query or mutation.
    pub query: String,
    /// Variables for the operation; always sent, empty when unset.
    pub variables: Value,
    /// Operation name (for documents with multiple operations).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphQLRequest {
    /// Create a new request with no variables.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Value::Object(Map::new()),
            operation_name: None,
        }
    }
}

/// Query builder for GraphQL queries.
pub struct QueryBuilder<'a> {
    client: &'a Client,
    request: GraphQLRequest,
    endpoint: Option<String>,
    api_key: Option<String>,
    headers: Vec<(String, String)>,
    variables_error: Option<serde_json::Error>,
}

impl<'a> QueryBuilder<'a> {
    /// Create a new query builder.
    pub(crate) fn new(client: &'a Client, query: impl Into<String>) -> Self {
        Self {
            client,
            request: GraphQLRequest::new(query),
            endpoint: None,
            api_key: None,
            headers: Vec::new(),
            variables_error: None,
        }
    }

    /// Set the operation name.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.request.operation_name = Some(name.into());
        self
    }

    /// Replace all variables.
    pub fn variables<T: Serialize>(mut self, variables: T) -> Self {
        match serde_json::to_value(variables) {
            Ok(Value::Null) => self.request.variables = Value::Object(Map::new()),
            Ok(value) => self.request.variables = value,
            Err(e) => self.variables_error = Some(e),
        }
        self
    }

    /// Set a single variable.
    pub fn variable(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                if !self.request.variables.is_object() {
                    self.request.variables = Value::Object(Map::new());
                }
                if let Value::Object(map) = &mut self.request.variables {
                    map.insert(name.into(), value);
                }
            }
            Err(e) => self.variables_error = Some(e),
        }
        self
    }

    /// Send to a different GraphQL endpoint than the configured one.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Authenticate this request with a different API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Add a header for this request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Get the request payload as it will be sent.
    pub fn request(&self) -> &GraphQLRequest {
        &self.request
    }

    /// Execute and return the full response.
    pub async fn send_response(self) -> Result<Response> {
        if let Some(e) = self.variables_error {
            return Err(Error::Json(e));
        }
        self.client
            .execute_graphql(
                &self.request,
                self.endpoint.as_deref(),
                self.headers,
                self.api_key.as_deref(),
            )
            .await
    }

    /// Execute and return the `data` object.
    pub async fn send(self) -> Result<Value> {
        let response = self.send_response().await?;
        Ok(response.data().cloned().unwrap_or(Value::Null))
    }

    /// Execute and deserialize the `data` object.
    pub async fn send_as<T: DeserializeOwned>(self) -> Result<T> {
        let data = self.send().await?;
        Ok(serde_json::from_value(data)?)
    }
}

/// Mutation builder for GraphQL mutations.
pub struct MutationBuilder<'a> {
    inner: QueryBuilder<'a>,
}

impl<'a> MutationBuilder<'a> {
    /// Create a new mutation builder.
    pub(crate) fn new(client: &'a Client, mutation: impl Into<String>) -> Self {
        Self {
            inner: QueryBuilder::new(client, mutation),
        }
    }

    /// Set the operation name.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.inner = self.inner.operation_name(name);
        self
    }

    /// Replace all variables.
    pub fn variables<T: Serialize>(mut self, variables: T) -> Self {
        self.inner = self.inner.variables(variables);
        self
    }

    /// Set a single variable.
    pub fn variable(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        self.inner = self.inner.variable(name, value);
        self
    }

    /// Send to a different GraphQL endpoint than the configured one.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.inner = self.inner.endpoint(url);
        self
    }

    /// Authenticate this request with a different API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.inner = self.inner.api_key(api_key);
        self
    }

    /// Add a header for this request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner = self.inner.header(name, value);
        self
    }

    /// Get the request payload as it will be sent.
    pub fn request(&self) -> &GraphQLRequest {
        self.inner.request()
    }

    /// Execute and return the full response.
    pub async fn send_response(self) -> Result<Response> {
        self.inner.send_response().await
    }

    /// Execute and return the `data` object.
    pub async fn send(self) -> Result<Value> {
        self.inner.send().await
    }

    /// Execute and deserialize the `data` object.
    pub async fn send_as<T: DeserializeOwned>(self) -> Result<T> {
        self.inner.send_as().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Configuration;
    use serde_json::json;

    fn client() -> Client {
        Client::new(Configuration::builder().api_key("k").build().unwrap()).unwrap()
    }

    #[test]
    fn test_request_serialization() {
        let request = GraphQLRequest::new("query { currentUser { eid } }");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"query": "query { currentUser { eid } }", "variables": {}}));
    }

    #[test]
    fn test_builder_variables() {
        let client = client();
        let builder = client
            .mutation("mutation Void($eid: String!) { voidEtchPacket(eid: $eid) }")
            .operation_name("Void")
            .variable("eid", "p1")
            .variable("reason", "duplicate");

        let value = serde_json::to_value(builder.request()).unwrap();
        assert_eq!(value["operationName"], "Void");
        assert_eq!(value["variables"], json!({"eid": "p1", "reason": "duplicate"}));
    }

    #[test]
    fn test_null_variables_become_empty_object() {
        let client = client();
        let builder = client.query("{ x }").variables(Option::<Value>::None);
        assert_eq!(builder.request().variables, json!({}));
    }
}

//! Anvil API client.

use bytes::Bytes;
use http::{header, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::graphql::{GraphQLRequest, MutationBuilder, QueryBuilder};
use crate::{global, Configuration, Error, RateLimiter, RequestBuilder, Response, Result};

/// Largest body echoed to the log in development mode.
const WIRE_ECHO_LIMIT: usize = 2048;

/// Client for the Anvil REST and GraphQL APIs.
///
/// Cloning is cheap; clones share the connection pool. Each client carries
/// its own copy of the configuration, so distinct clients never share
/// mutable state.
#[derive(Clone)]
pub struct Client {
    inner: reqwest::Client,
    config: Arc<Configuration>,
    api_key: Arc<SecretString>,
    rate_limiter: RateLimiter,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client from an explicit configuration.
    ///
    /// Fails with [`Error::Configuration`] when no usable API key is set.
    pub fn new(config: Configuration) -> Result<Self> {
        config.validate()?;
        let api_key = config
            .api_key()
            .ok_or_else(|| Error::Configuration("No API key configured".to_string()))?;

        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.open_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner,
            rate_limiter: RateLimiter::from_config(&config),
            config: Arc::new(config),
            api_key: Arc::new(SecretString::from(api_key)),
        })
    }

    /// Create a client from a copy of the process-default configuration.
    pub fn from_global() -> Result<Self> {
        Self::new(global::configuration())
    }

    /// Create a client for a specific API key, leaving every other setting
    /// at the process-default configuration.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        let mut config = global::configuration();
        config.set_api_key(api_key);
        Self::new(config)
    }

    /// Get the memoised client for the process-default configuration.
    pub fn shared() -> Result<Self> {
        global::shared_client()
    }

    /// Get the client configuration.
    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Get the rate limiter applied to every request.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Create a GET request builder.
    pub fn get(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::GET, path.into())
    }

    /// Create a POST request builder.
    pub fn post(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::POST, path.into())
    }

    /// Create a PUT request builder.
    pub fn put(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::PUT, path.into())
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::PATCH, path.into())
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::DELETE, path.into())
    }

    /// Create a GraphQL query builder.
    pub fn query(&self, query: impl Into<String>) -> QueryBuilder<'_> {
        QueryBuilder::new(self, query)
    }

    /// Create a GraphQL mutation builder.
    pub fn mutation(&self, mutation: impl Into<String>) -> MutationBuilder<'_> {
        MutationBuilder::new(self, mutation)
    }

    /// Resolve a path against the base URL. Absolute URLs pass through.
    pub(crate) fn resolve_url(&self, path: &str) -> Result<Url> {
        let raw = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };
        Url::parse(&raw).map_err(|e| Error::InvalidUrl(format!("{}: {}", raw, e)))
    }

    /// Send one logical request through the rate limiter and classify the
    /// final response.
    pub(crate) async fn execute(
        &self,
        method: Method,
        url: Url,
        headers: Vec<(String, String)>,
        body: Option<Bytes>,
        api_key: Option<&str>,
    ) -> Result<Response> {
        let api_key = api_key.unwrap_or_else(|| self.api_key.expose_secret());
        debug!(method = %method, url = %url, "Sending request");
        if self.config.is_development() {
            echo_request(&method, &url, body.as_ref());
        }

        let response = self
            .rate_limiter
            .with_retry(|| {
                let mut request = self
                    .inner
                    .request(method.clone(), url.clone())
                    .basic_auth(api_key, Some(""))
                    .header(header::ACCEPT, "application/json");
                for (name, value) in &headers {
                    request = request.header(name.as_str(), value.as_str());
                }
                if let Some(body) = &body {
                    request = request.body(body.clone());
                }
                async move {
                    let response = request.send().await?;
                    Response::from_reqwest(response).await
                }
            })
            .await?;

        debug!(status = %response.status(), url = %url, "Received response");
        if self.config.is_development() {
            echo_response(&response);
        }

        classify(response)
    }

    /// POST a GraphQL document and fail on a non-empty `errors` array.
    pub(crate) async fn execute_graphql(
        &self,
        request: &GraphQLRequest,
        endpoint: Option<&str>,
        headers: Vec<(String, String)>,
        api_key: Option<&str>,
    ) -> Result<Response> {
        let endpoint = endpoint.unwrap_or(&self.config.graphql_url);
        let url = Url::parse(endpoint)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", endpoint, e)))?;

        let mut headers = headers;
        headers.push((
            header::CONTENT_TYPE.as_str().to_string(),
            "application/json".to_string(),
        ));
        let body = Bytes::from(serde_json::to_vec(request)?);

        let response = self
            .execute(Method::POST, url, headers, Some(body), api_key)
            .await?;

        let errors = response.graphql_errors();
        if !errors.is_empty() {
            return Err(Error::GraphQL {
                message: crate::error::join_messages(&errors),
                status: response.status().as_u16(),
                errors,
            });
        }

        Ok(response)
    }
}

/// Map a completed response to success or the matching error kind.
pub(crate) fn classify(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let errors = response.errors();
    let message = response.error_message();
    let code = status.as_u16();

    Err(match status {
        StatusCode::BAD_REQUEST => Error::Validation {
            message,
            status: code,
            errors,
        },
        StatusCode::UNAUTHORIZED => Error::Authentication {
            message: format!(
                "{}. Check that your API key is correct and has access to this resource",
                message
            ),
            status: code,
            errors,
        },
        StatusCode::NOT_FOUND => Error::NotFound {
            message,
            status: Some(code),
            errors,
        },
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimit {
            message,
            retries: 0,
            retry_after: response.retry_after(),
            errors,
        },
        s if s.is_server_error() => Error::Server {
            message,
            status: code,
            errors,
        },
        _ => Error::Api {
            message,
            status: Some(code),
            errors,
        },
    })
}

fn echo_request(method: &Method, url: &Url, body: Option<&Bytes>) {
    match body {
        Some(body) => debug!(
            target: "anvil::wire",
            method = %method,
            url = %url,
            body = %preview(body),
            "-> request"
        ),
        None => debug!(target: "anvil::wire", method = %method, url = %url, "-> request"),
    }
}

fn echo_response(response: &Response) {
    let body = if response.is_binary() {
        format!(
            "<{} bytes of {}>",
            response.body().len(),
            response.content_type().unwrap_or("binary")
        )
    } else {
        preview(response.body())
    };
    debug!(target: "anvil::wire", status = %response.status(), body = %body, "<- response");
}

fn preview(body: &Bytes) -> String {
    let end = body.len().min(WIRE_ECHO_LIMIT);
    let mut text = String::from_utf8_lossy(&body[..end]).into_owned();
    if body.len() > WIRE_ECHO_LIMIT {
        text.push_str("...");
    }
    text
}

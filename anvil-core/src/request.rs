//! Request builder.

use crate::{Client, Error, Response, Result};
use bytes::Bytes;
use http::Method;
use serde::Serialize;

/// REST request builder.
///
/// Created through [`Client::get`], [`Client::post`] and friends. Nothing is
/// sent until [`send`](Self::send) is awaited.
pub struct RequestBuilder<'a> {
    client: &'a Client,
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Option<Bytes>,
    api_key: Option<String>,
    body_error: Option<serde_json::Error>,
}

impl<'a> RequestBuilder<'a> {
    /// Create a new request builder.
    pub(crate) fn new(client: &'a Client, method: Method, path: String) -> Self {
        Self {
            client,
            method,
            path,
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            api_key: None,
            body_error: None,
        }
    }

    /// Add a header to the request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add multiple headers to the request.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in headers {
            self.headers.push((k.into(), v.into()));
        }
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add multiple query parameters.
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in params {
            self.query.push((k.into(), v.into()));
        }
        self
    }

    /// Set the request body as raw bytes.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the request body as JSON.
    ///
    /// A serialization failure is reported when the request is sent.
    pub fn json<T: Serialize + ?Sized>(mut self, json: &T) -> Self {
        match serde_json::to_vec(json) {
            Ok(bytes) => {
                self.headers.retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
                self.headers
                    .push(("content-type".to_string(), "application/json".to_string()));
                self.body = Some(Bytes::from(bytes));
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize JSON body");
                self.body_error = Some(e);
            }
        }
        self
    }

    /// Authenticate this request with a different API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Build the URL with query parameters.
    fn build_url(&self) -> Result<url::Url> {
        let mut url = self.client.resolve_url(&self.path)?;

        if !self.query.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                query_pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Send the request, retrying on rate limits, and classify the result.
    pub async fn send(mut self) -> Result<Response> {
        if let Some(e) = self.body_error.take() {
            return Err(Error::Json(e));
        }
        let url = self.build_url()?;
        self.client
            .execute(self.method, url, self.headers, self.body, self.api_key.as_deref())
            .await
    }
}

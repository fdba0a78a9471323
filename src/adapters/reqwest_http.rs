//! Reqwest-based HTTP transport adapter.
//!
//! This module provides the production transport implementation using
//! reqwest, implementing the [`HttpClient`] trait from `crate::traits`.

use async_trait::async_trait;

use crate::traits::{ApiError, Headers, HttpClient, Response};

/// HTTP transport implementation using reqwest.
///
/// Wraps a `reqwest::Client` and implements the [`HttpClient`] trait.
/// Statuses are passed through untouched so callers can inspect error
/// bodies before classifying them.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a new ReqwestHttpClient with a custom reqwest::Client.
    ///
    /// This allows for advanced configuration like custom timeouts,
    /// connection pools, or TLS settings.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying reqwest::Client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Convert reqwest error to ApiError.
    fn convert_error(err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_connect() {
            ApiError::Connection(err.to_string())
        } else {
            ApiError::Other(err.to_string())
        }
    }

    /// Convert reqwest headers to our Headers type.
    fn convert_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    /// Apply headers to a request builder.
    fn apply_headers(
        builder: reqwest::RequestBuilder,
        headers: &Headers,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder;
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder
    }

    fn builder_for(&self, method: &str, url: &str) -> Result<reqwest::RequestBuilder, ApiError> {
        match method {
            "POST" => Ok(self.client.post(url)),
            "PUT" => Ok(self.client.put(url)),
            "PATCH" => Ok(self.client.patch(url)),
            "DELETE" => Ok(self.client.delete(url)),
            other => Err(ApiError::Other(format!(
                "unsupported HTTP method: {}",
                other
            ))),
        }
    }

    async fn finish(builder: reqwest::RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(Self::convert_error)?;

        let status = response.status().as_u16();
        let response_headers = Self::convert_headers(response.headers());
        let body = response.bytes().await.map_err(Self::convert_error)?;

        Ok(Response::with_headers(status, response_headers, body))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, ApiError> {
        let builder = self.client.get(url);
        let builder = Self::apply_headers(builder, headers);
        Self::finish(builder).await
    }

    async fn send_json(
        &self,
        method: &str,
        url: &str,
        headers: &Headers,
        body: Option<serde_json::Value>,
    ) -> Result<Response, ApiError> {
        let builder = self.builder_for(method, url)?;
        let builder = Self::apply_headers(builder, headers);
        let builder = match body {
            Some(json) => builder.json(&json),
            None => builder,
        };
        Self::finish(builder).await
    }

    async fn send_bytes(
        &self,
        url: &str,
        headers: &Headers,
        body: Vec<u8>,
    ) -> Result<Response, ApiError> {
        let builder = self.client.post(url).body(body);
        let builder = Self::apply_headers(builder, headers);
        Self::finish(builder).await
    }
}

//! HTTP transport trait abstraction.
//!
//! Provides a trait-based abstraction for the REST calls the API client
//! makes, enabling dependency injection and mocking in tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// HTTP response wrapper.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, body: Bytes) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// Create a new response with headers.
    pub fn with_headers(status: u16, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body as a string.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Parse the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Errors raised by the API transport and client.
///
/// The type is `Clone` because cached and deduplicated requests hand the
/// same outcome to several callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Base URL or token missing or malformed
    InvalidConfig(String),
    /// Connection failed (DNS, refused, reset)
    Connection(String),
    /// Request timed out
    Timeout(String),
    /// Server returned a non-success status
    Status { status: u16, message: String },
    /// Response body was not the expected JSON
    Json(String),
    /// Local IO failed (reading a file for upload)
    Io(String),
    /// Other error
    Other(String),
}

impl ApiError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Server-side failures (5xx), throttling (429) and request timeouts
    /// (408) are retryable, as are transport-level connection errors.
    /// Client mistakes (4xx), config and parse errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Connection(_) | ApiError::Timeout(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            ApiError::InvalidConfig(_)
            | ApiError::Json(_)
            | ApiError::Io(_)
            | ApiError::Other(_) => false,
        }
    }

    /// Whether the error means the token was rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. })
    }

    /// Get a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::InvalidConfig(_) => {
                "The client is not configured. Check the API URL and access token.".to_string()
            }
            ApiError::Connection(_) => {
                "Unable to reach the photo service. Check your connection.".to_string()
            }
            ApiError::Timeout(_) => "The request timed out. Please try again.".to_string(),
            ApiError::Status { status: 401, .. } => {
                "Your session has expired. Please sign in again.".to_string()
            }
            ApiError::Status { status: 403, .. } => {
                "You don't have permission to do that.".to_string()
            }
            ApiError::Status { status: 404, .. } => {
                "The requested item was not found.".to_string()
            }
            ApiError::Status { status, .. } if *status >= 500 => {
                "The photo service had a problem. Please try again shortly.".to_string()
            }
            ApiError::Status { status, .. } => {
                format!("The photo service rejected the request (HTTP {}).", status)
            }
            ApiError::Json(_) => "Received an unexpected response from the service.".to_string(),
            ApiError::Io(msg) => format!("File error: {}", msg),
            ApiError::Other(msg) => format!("Request failed: {}", msg),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            ApiError::Connection(msg) => write!(f, "Connection failed: {}", msg),
            ApiError::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            ApiError::Status { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            ApiError::Json(msg) => write!(f, "Invalid JSON response: {}", msg),
            ApiError::Io(msg) => write!(f, "IO error: {}", msg),
            ApiError::Other(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Json(err.to_string())
    }
}

/// Trait for the HTTP operations the API client needs.
///
/// This trait abstracts HTTP operations to enable dependency injection
/// and mocking in tests. Implementations include the production
/// reqwest-based transport and a mock for tests.
///
/// Implementations return the response for any status; mapping
/// non-success statuses to [`ApiError::Status`] is the caller's job, so
/// error bodies stay readable.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request.
    ///
    /// # Arguments
    /// * `url` - The URL to request
    /// * `headers` - Request headers
    ///
    /// # Returns
    /// The response or an error
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, ApiError>;

    /// Perform a request with an optional JSON body.
    ///
    /// # Arguments
    /// * `method` - One of `POST`, `PUT`, `PATCH`, `DELETE`
    /// * `url` - The URL to request
    /// * `headers` - Request headers
    /// * `body` - JSON body, omitted when `None`
    ///
    /// # Returns
    /// The response or an error
    async fn send_json(
        &self,
        method: &str,
        url: &str,
        headers: &Headers,
        body: Option<serde_json::Value>,
    ) -> Result<Response, ApiError>;

    /// Perform a POST request with a raw byte body.
    ///
    /// Used for photo uploads, where the body is the file content.
    ///
    /// # Arguments
    /// * `url` - The URL to request
    /// * `headers` - Request headers
    /// * `body` - Raw request body
    ///
    /// # Returns
    /// The response or an error
    async fn send_bytes(
        &self,
        url: &str,
        headers: &Headers,
        body: Vec<u8>,
    ) -> Result<Response, ApiError>;
}

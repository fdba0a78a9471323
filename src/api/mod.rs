//! HTTP client for the Lightbox photo service REST API.
//!
//! [`LightboxClient`] wraps the JSON endpoints behind typed methods. All
//! requests carry the configured bearer token. Reads go through a short
//! TTL cache and an in-flight map so concurrent identical GETs share one
//! network round trip, and a semaphore keeps the number of requests on
//! the wire at or below [`MAX_CONCURRENT_REQUESTS`]. Mutations invalidate
//! the affected cache prefix on success.
//!
//! The actual transport sits behind the [`HttpClient`] trait so tests
//! can swap in [`crate::adapters::MockHttpClient`].

pub mod backoff;
pub mod cache;

pub use backoff::Backoff;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};

use crate::adapters::ReqwestHttpClient;
use crate::models::{
    AiMetadata, Collectible, CollectiblePatch, NewCollectible, Photo, PhotoPatch, PhotoState,
    PrivilegeSet,
};
use crate::traits::{ApiError, Headers, HttpClient, Response};

use cache::ResponseCache;

/// Upper bound on requests in flight at once.
pub const MAX_CONCURRENT_REQUESTS: usize = 6;

/// How long successful GET responses are served from memory.
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15);

type SharedResponse = Shared<BoxFuture<'static, Result<Response, ApiError>>>;

/// Typed client for the photo service.
///
/// Cheap to share via `Arc`; all methods take `&self`.
pub struct LightboxClient {
    base_url: String,
    token: String,
    http: Arc<dyn HttpClient>,
    limiter: Arc<Semaphore>,
    cache: ResponseCache,
    inflight: Mutex<HashMap<String, SharedResponse>>,
}

impl LightboxClient {
    /// Create a client talking to `base_url` with the given bearer token.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_transport(base_url, token, Arc::new(ReqwestHttpClient::new()))
    }

    /// Create a client over a custom transport, e.g. a mock in tests.
    pub fn with_transport(
        base_url: impl Into<String>,
        token: impl Into<String>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            http,
            limiter: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
            cache: ResponseCache::new(DEFAULT_CACHE_TTL),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the read cache TTL. A zero TTL disables caching.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = ResponseCache::new(ttl);
        self
    }

    /// List all photos visible to the account.
    pub async fn list_photos(&self) -> Result<Vec<Photo>, ApiError> {
        let response = self.get_raw("/photos").await?;
        Self::parse(&response)
    }

    /// Fetch a single photo by id.
    pub async fn get_photo(&self, photo_id: &str) -> Result<Photo, ApiError> {
        let response = self.get_raw(&format!("/photos/{}", photo_id)).await?;
        Self::parse(&response)
    }

    /// Fetch the AI metadata for a photo.
    pub async fn photo_metadata(&self, photo_id: &str) -> Result<AiMetadata, ApiError> {
        let response = self
            .get_raw(&format!("/photos/{}/metadata", photo_id))
            .await?;
        Self::parse(&response)
    }

    /// Upload a photo as raw bytes.
    ///
    /// The file name travels percent-encoded in `X-File-Name` and the
    /// body digest in `X-Content-Sha256`, so the server can verify the
    /// upload arrived intact.
    pub async fn upload_photo(&self, file_name: &str, bytes: Vec<u8>) -> Result<Photo, ApiError> {
        self.ensure_config()?;
        let name = file_name.trim();
        if name.is_empty() {
            return Err(ApiError::Other("upload file name is empty".to_string()));
        }

        let digest = hex::encode(Sha256::digest(&bytes));
        let mut headers = self.auth_headers();
        headers.insert(
            "Content-Type".to_string(),
            "application/octet-stream".to_string(),
        );
        headers.insert(
            "X-File-Name".to_string(),
            urlencoding::encode(name).into_owned(),
        );
        headers.insert("X-Content-Sha256".to_string(), digest);

        let _permit = self.acquire_permit().await?;
        let response = self
            .http
            .send_bytes(&self.url("/photos"), &headers, bytes)
            .await?;
        let response = Self::fail_for_status(response)?;
        self.cache.invalidate_prefix("/photos").await;
        Self::parse(&response)
    }

    /// Move a photo to the given state.
    pub async fn set_photo_state(
        &self,
        photo_id: &str,
        state: PhotoState,
    ) -> Result<Photo, ApiError> {
        let body = serde_json::json!({ "state": state });
        let response = self
            .request_json("POST", &format!("/photos/{}/state", photo_id), Some(body))
            .await?;
        self.cache.invalidate_prefix("/photos").await;
        Self::parse(&response)
    }

    /// Move a photo one step forward in its state progression.
    ///
    /// Fails without a network call when the photo is already finished.
    pub async fn advance_photo_state(&self, photo: &Photo) -> Result<Photo, ApiError> {
        match photo.state.next() {
            Some(next) => self.set_photo_state(&photo.id, next).await,
            None => Err(ApiError::Other(format!(
                "photo {} is already finished",
                photo.id
            ))),
        }
    }

    /// Apply a partial update to a photo.
    pub async fn update_photo(
        &self,
        photo_id: &str,
        patch: &PhotoPatch,
    ) -> Result<Photo, ApiError> {
        let body = serde_json::to_value(patch)?;
        let response = self
            .request_json("PATCH", &format!("/photos/{}", photo_id), Some(body))
            .await?;
        self.cache.invalidate_prefix("/photos").await;
        Self::parse(&response)
    }

    /// Delete a photo.
    pub async fn delete_photo(&self, photo_id: &str) -> Result<(), ApiError> {
        self.request_json("DELETE", &format!("/photos/{}", photo_id), None)
            .await?;
        self.cache.invalidate_prefix("/photos").await;
        Ok(())
    }

    /// List all collectible records.
    pub async fn list_collectibles(&self) -> Result<Vec<Collectible>, ApiError> {
        let response = self.get_raw("/collectibles").await?;
        Self::parse(&response)
    }

    /// Create a collectible record.
    pub async fn create_collectible(
        &self,
        draft: &NewCollectible,
    ) -> Result<Collectible, ApiError> {
        let body = serde_json::to_value(draft)?;
        let response = self
            .request_json("POST", "/collectibles", Some(body))
            .await?;
        self.cache.invalidate_prefix("/collectibles").await;
        Self::parse(&response)
    }

    /// Apply a partial update to a collectible.
    pub async fn update_collectible(
        &self,
        collectible_id: &str,
        patch: &CollectiblePatch,
    ) -> Result<Collectible, ApiError> {
        let body = serde_json::to_value(patch)?;
        let response = self
            .request_json(
                "PATCH",
                &format!("/collectibles/{}", collectible_id),
                Some(body),
            )
            .await?;
        self.cache.invalidate_prefix("/collectibles").await;
        Self::parse(&response)
    }

    /// Delete a collectible record.
    pub async fn delete_collectible(&self, collectible_id: &str) -> Result<(), ApiError> {
        self.request_json("DELETE", &format!("/collectibles/{}", collectible_id), None)
            .await?;
        self.cache.invalidate_prefix("/collectibles").await;
        Ok(())
    }

    /// Fetch the account's privilege set.
    pub async fn privileges(&self) -> Result<PrivilegeSet, ApiError> {
        let response = self.get_raw("/me/privileges").await?;
        Self::parse(&response)
    }

    /// GET with caching, in-flight deduplication and concurrency limiting.
    ///
    /// Identical paths requested while a fetch is still in the air share
    /// that fetch's outcome instead of issuing another request.
    async fn get_raw(&self, path: &str) -> Result<Response, ApiError> {
        self.ensure_config()?;

        if let Some(cached) = self.cache.get(path).await {
            return Ok(cached);
        }

        let fetch = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(path) {
                Some(pending) => pending.clone(),
                None => {
                    let http = Arc::clone(&self.http);
                    let limiter = Arc::clone(&self.limiter);
                    let url = self.url(path);
                    let headers = self.auth_headers();
                    let future: BoxFuture<'static, Result<Response, ApiError>> =
                        Box::pin(async move {
                            let _permit = limiter.acquire_owned().await.map_err(|_| {
                                ApiError::Other("request limiter closed".to_string())
                            })?;
                            http.get(&url, &headers).await
                        });
                    let shared = future.shared();
                    inflight.insert(path.to_string(), shared.clone());
                    shared
                }
            }
        };

        let result = fetch.await;
        self.inflight.lock().await.remove(path);

        let response = Self::fail_for_status(result?)?;
        self.cache.put(path.to_string(), response.clone()).await;
        Ok(response)
    }

    /// Mutation helper. Not cached, not deduplicated.
    async fn request_json(
        &self,
        method: &str,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response, ApiError> {
        self.ensure_config()?;
        let _permit = self.acquire_permit().await?;
        let response = self
            .http
            .send_json(method, &self.url(path), &self.auth_headers(), body)
            .await?;
        Self::fail_for_status(response)
    }

    async fn acquire_permit(&self) -> Result<tokio::sync::SemaphorePermit<'_>, ApiError> {
        self.limiter
            .acquire()
            .await
            .map_err(|_| ApiError::Other("request limiter closed".to_string()))
    }

    fn ensure_config(&self) -> Result<(), ApiError> {
        if self.base_url.trim().is_empty() {
            return Err(ApiError::InvalidConfig("API base URL is empty".to_string()));
        }
        if self.token.trim().is_empty() {
            return Err(ApiError::InvalidConfig("access token is empty".to_string()));
        }
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn auth_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.token.trim()),
        );
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers
    }

    fn fail_for_status(response: Response) -> Result<Response, ApiError> {
        if response.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ApiError::Status {
            status: response.status,
            message,
        })
    }

    fn parse<T: DeserializeOwned>(response: &Response) -> Result<T, ApiError> {
        response.json().map_err(|e| ApiError::Json(e.to_string()))
    }
}

//! Short-lived response cache for GET requests.
//!
//! Read endpoints are hit repeatedly while the user navigates, so
//! successful GET responses are kept for a short TTL and served from
//! memory. Mutations invalidate by path prefix so the next read sees
//! fresh data.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::traits::Response;

struct CacheEntry {
    stored_at: Instant,
    response: Response,
}

/// TTL cache keyed by request path.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a fresh entry. Expired entries are removed on the way.
    pub async fn get(&self, key: &str) -> Option<Response> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.response.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn put(&self, key: String, response: Response) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                response,
            },
        );
    }

    /// Drop every entry whose key starts with `prefix`.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        let mut entries = self.entries.lock().await;
        entries.retain(|key, _| !key.starts_with(prefix));
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn response(body: &str) -> Response {
        Response::new(200, Bytes::from(body.to_string()))
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.put("/photos".to_string(), response("[]")).await;
        let hit = cache.get("/photos").await.unwrap();
        assert_eq!(hit.body, Bytes::from("[]"));
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_caching() {
        let cache = ResponseCache::new(Duration::ZERO);
        cache.put("/photos".to_string(), response("[]")).await;
        assert!(cache.get("/photos").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted() {
        let cache = ResponseCache::new(Duration::from_millis(5));
        cache.put("/photos".to_string(), response("[]")).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get("/photos").await.is_none());
    }

    #[tokio::test]
    async fn test_prefix_invalidation() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.put("/photos".to_string(), response("[]")).await;
        cache.put("/photos/p1".to_string(), response("{}")).await;
        cache
            .put("/collectibles".to_string(), response("[]"))
            .await;

        cache.invalidate_prefix("/photos").await;

        assert!(cache.get("/photos").await.is_none());
        assert!(cache.get("/photos/p1").await.is_none());
        assert!(cache.get("/collectibles").await.is_some());
    }
}

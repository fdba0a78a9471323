//! Cached lookup of the account's privilege set.
//!
//! Privileges gate UI affordances (upload, edit, catalog) and change
//! rarely, so they are fetched once and reused for a TTL instead of on
//! every check.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::api::LightboxClient;
use crate::models::PrivilegeSet;
use crate::traits::ApiError;

/// How long a fetched privilege set stays valid.
pub const DEFAULT_PRIVILEGE_TTL: Duration = Duration::from_secs(300);

/// TTL cache over `/me/privileges`.
pub struct PrivilegeCache {
    client: Arc<LightboxClient>,
    ttl: Duration,
    cached: Mutex<Option<(Instant, PrivilegeSet)>>,
}

impl PrivilegeCache {
    pub fn new(client: Arc<LightboxClient>) -> Self {
        Self {
            client,
            ttl: DEFAULT_PRIVILEGE_TTL,
            cached: Mutex::new(None),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The current privilege set, from cache when fresh.
    ///
    /// Concurrent callers serialize on the cache lock, so an expired
    /// entry is refreshed by exactly one request.
    pub async fn get(&self) -> Result<PrivilegeSet, ApiError> {
        let mut cached = self.cached.lock().await;
        if let Some((fetched_at, privileges)) = &*cached {
            if fetched_at.elapsed() < self.ttl {
                return Ok(*privileges);
            }
        }

        let privileges = self.client.privileges().await?;
        *cached = Some((Instant::now(), privileges));
        Ok(privileges)
    }

    /// Drop the cached value, e.g. after a 403 suggests it is stale.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

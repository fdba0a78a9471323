//! Periodic status refresh for photos the event stream might miss.
//!
//! Photos registered in [`PollingState`](crate::store::PollingState) are
//! re-fetched on a fixed interval until they reach their terminal state,
//! at which point the reducer drops them from the set. This papers over
//! gaps when the event stream is down or behind.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::api::LightboxClient;
use crate::store::{Action, BannerKind, Store};

/// Default spacing between poll rounds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Background poller for unfinished photos.
pub struct StatusPoller {
    client: Arc<LightboxClient>,
    store: Store,
    interval: Duration,
    cancel: CancellationToken,
}

impl StatusPoller {
    pub fn new(client: Arc<LightboxClient>, store: Store) -> Self {
        Self {
            client,
            store,
            interval: DEFAULT_POLL_INTERVAL,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Token that stops the poller when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the poll loop on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = ticker.tick() => self.poll_registered().await,
            }
        }
    }

    async fn poll_registered(&self) {
        let photo_ids: Vec<String> = self
            .store
            .select(|s| s.polling.photo_ids.iter().cloned().collect())
            .await;

        for photo_id in photo_ids {
            if self.cancel.is_cancelled() {
                return;
            }
            match self.client.get_photo(&photo_id).await {
                Ok(photo) => {
                    self.store.dispatch(Action::PhotoUpserted(photo)).await;
                }
                Err(e) if e.is_auth_error() => {
                    tracing::warn!("status poll stopped, token rejected");
                    self.store
                        .dispatch(Action::BannerShown {
                            message: e.user_message(),
                            kind: BannerKind::Error,
                        })
                        .await;
                    self.cancel.cancel();
                    return;
                }
                Err(e) => {
                    tracing::debug!("status poll for {} failed: {}", photo_id, e);
                }
            }
        }
    }
}

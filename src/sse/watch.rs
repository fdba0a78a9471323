//! Reconnecting supervisor for the photo event stream.
//!
//! [`EventWatcher`] owns a connect/read/reconnect loop around
//! [`PhotoEventsClient`]. Received frames advance the resume cursor,
//! decode into [`PhotoEvent`]s, update the store, and optionally fan
//! out to a channel. Reconnects back off exponentially and the backoff
//! resets once a connection has delivered at least one frame.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::Backoff;
use crate::events::PhotoEvent;
use crate::sse::client::{ConnectOptions, PhotoEventsClient, SseError};
use crate::store::{Action, Store};

/// Tuning knobs for the watcher loop.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// First reconnect delay
    pub initial_backoff: Duration,
    /// Ceiling for the doubled delay
    pub max_backoff: Duration,
    /// Cursor to resume from on the first connection
    pub since: Option<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            since: None,
        }
    }
}

impl WatcherConfig {
    pub fn with_since(mut self, since: Option<String>) -> Self {
        self.since = since;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }
}

/// Long-running consumer of the photo event stream.
pub struct EventWatcher {
    client: PhotoEventsClient,
    store: Store,
    forward: Option<mpsc::UnboundedSender<PhotoEvent>>,
    config: WatcherConfig,
    cancel: CancellationToken,
}

impl EventWatcher {
    pub fn new(client: PhotoEventsClient, store: Store) -> Self {
        Self {
            client,
            store,
            forward: None,
            config: WatcherConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: WatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Also send every decoded event to `tx`, e.g. for display.
    pub fn with_forward_channel(mut self, tx: mpsc::UnboundedSender<PhotoEvent>) -> Self {
        self.forward = Some(tx);
        self
    }

    /// Token that stops the watcher when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until cancelled.
    ///
    /// Connection failures are logged and retried; only an invalid
    /// configuration is returned as an error, since no amount of
    /// retrying fixes a missing token.
    pub async fn run(mut self) -> Result<(), SseError> {
        let mut backoff = Backoff::new(self.config.initial_backoff, self.config.max_backoff);
        let mut cursor = self.config.since.take();

        loop {
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            let mut options = ConnectOptions::new().with_cancel(self.cancel.clone());
            if let Some(resume_from) = &cursor {
                options = options.with_since(resume_from.clone());
            }

            match self.client.connect(options).await {
                Ok(mut handle) => {
                    let mut delivered = 0usize;
                    while let Some(frame) = handle.next_frame().await {
                        delivered += 1;
                        if let Some(id) = &frame.id {
                            cursor = Some(id.clone());
                            self.store
                                .dispatch(Action::CursorAdvanced { cursor: id.clone() })
                                .await;
                        }
                        match PhotoEvent::from_frame(&frame) {
                            Ok(event) => {
                                self.store.apply_event(&event).await;
                                if let Some(tx) = &self.forward {
                                    let _ = tx.send(event);
                                }
                            }
                            Err(e) => {
                                tracing::warn!("skipping undecodable event: {}", e);
                            }
                        }
                    }
                    match handle.closed().await {
                        Ok(()) => {
                            if self.cancel.is_cancelled() {
                                return Ok(());
                            }
                            tracing::info!("photo event stream ended, reconnecting");
                        }
                        Err(e) => {
                            tracing::warn!("photo event stream failed: {}", e);
                        }
                    }
                    if delivered > 0 {
                        backoff.reset();
                    }
                }
                Err(e @ SseError::InvalidConfig(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!("event stream connect failed: {}", e);
                }
            }

            let delay = backoff.next_delay();
            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

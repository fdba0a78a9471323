//! Reactive application state store.
//!
//! A single [`AppState`] guarded by a lock, changed only through
//! [`Action`]s, observed through selector subscriptions. A subscription
//! is a `tokio::sync::watch` channel fed by re-running its selector
//! after every dispatch; the watch side only signals when the selected
//! value actually changed, so a caption edit never wakes a reader that
//! watches file names.
//!
//! Notifications run on the dispatching task before `dispatch` returns,
//! which keeps test code free of sleeps: once a dispatch completes, all
//! live subscriptions have seen it.

pub mod actions;
pub mod state;

pub use actions::{reduce, Action};
pub use state::{
    ActiveView, AppState, Banner, BannerKind, PhotoProgress, PickerState, PollingState, ViewState,
};

use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::events::PhotoEvent;

type Notifier = Box<dyn Fn(&AppState) -> bool + Send>;

struct StoreInner {
    state: Mutex<AppState>,
    subscribers: Mutex<Vec<Notifier>>,
}

/// Handle to the shared application state.
///
/// Clones share the same state; hand one to every service.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(AppState::default()),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Apply an action and notify affected subscriptions.
    pub async fn dispatch(&self, action: Action) {
        let mut state = self.inner.state.lock().await;
        tracing::trace!(action = ?action, "store dispatch");
        reduce(&mut state, action);

        let mut subscribers = self.inner.subscribers.lock().await;
        subscribers.retain(|notify| notify(&state));
    }

    /// Clone the full current state.
    pub async fn snapshot(&self) -> AppState {
        self.inner.state.lock().await.clone()
    }

    /// Read a derived value without cloning the whole state.
    pub async fn select<T>(&self, selector: impl Fn(&AppState) -> T) -> T {
        let state = self.inner.state.lock().await;
        selector(&state)
    }

    /// Subscribe to a derived value.
    ///
    /// The subscription starts at the selector's current value and
    /// signals only when a dispatch changes that value. Dropping the
    /// subscription unregisters it on the next dispatch.
    pub async fn subscribe<T, S>(&self, selector: S) -> Subscription<T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
        S: Fn(&AppState) -> T + Send + 'static,
    {
        let initial = {
            let state = self.inner.state.lock().await;
            selector(&state)
        };
        let (tx, rx) = watch::channel(initial);

        let mut subscribers = self.inner.subscribers.lock().await;
        subscribers.push(Box::new(move |state: &AppState| {
            if tx.is_closed() {
                return false;
            }
            tx.send_if_modified(|current| {
                let next = selector(state);
                if *current == next {
                    false
                } else {
                    *current = next;
                    true
                }
            });
            true
        }));

        Subscription { rx }
    }

    /// Translate a stream event into the matching action, if any.
    pub async fn apply_event(&self, event: &PhotoEvent) {
        let action = match event {
            PhotoEvent::Processing(p) => Action::ProgressReported {
                photo_id: p.photo_id.clone(),
                stage: p.stage.clone(),
                percent: p.progress,
            },
            PhotoEvent::StateChanged(s) => Action::PhotoStateChanged {
                photo_id: s.photo_id.clone(),
                state: s.state,
            },
            PhotoEvent::Updated(photo) => Action::PhotoUpserted(photo.clone()),
            PhotoEvent::MetadataReady(m) => Action::MetadataMerged {
                photo_id: m.photo_id.clone(),
                metadata: m.metadata.clone(),
            },
            PhotoEvent::Removed(r) => Action::PhotoRemoved {
                photo_id: r.photo_id.clone(),
            },
            PhotoEvent::CollectibleUpdated(c) => Action::CollectibleUpserted(c.clone()),
            PhotoEvent::CollectibleRemoved(c) => Action::CollectibleRemoved {
                collectible_id: c.collectible_id.clone(),
            },
            PhotoEvent::Ping | PhotoEvent::Unknown { .. } => return,
        };
        self.dispatch(action).await;
    }

    #[cfg(test)]
    async fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().await.len()
    }
}

/// Receiver side of a store subscription.
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    /// The most recently selected value, without consuming the change
    /// notification.
    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }

    /// The most recently selected value, consuming the notification.
    pub fn latest(&mut self) -> T {
        self.rx.borrow_and_update().clone()
    }

    /// Whether an unseen change is waiting.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next change. Returns `false` when the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

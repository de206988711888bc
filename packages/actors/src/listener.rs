//! Ordered delivery of subscription change notifications.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use sync_core::{Interests, SyncEvent};
use tokio::sync::{broadcast, mpsc, oneshot};

/// Receives the new interest set whenever it changes.
pub trait SubscriptionsChangedListener: Send + Sync + 'static {
    fn on_subscriptions_changed(&self, interests: &Interests);
}

impl<F> SubscriptionsChangedListener for F
where
    F: Fn(&Interests) + Send + Sync + 'static,
{
    fn on_subscriptions_changed(&self, interests: &Interests) {
        self(interests)
    }
}

type ListenerSlot = Arc<RwLock<Option<Arc<dyn SubscriptionsChangedListener>>>>;

enum Notification {
    Changed {
        listener: Option<Arc<dyn SubscriptionsChangedListener>>,
        interests: Interests,
    },
    Flush(oneshot::Sender<()>),
}

/// Delivers notifications one at a time, in the order they were raised, on a
/// single dedicated task.
///
/// Must be created inside a tokio runtime.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
    listener: ListenerSlot,
    event_tx: Option<broadcast::Sender<SyncEvent>>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(dispatch(rx));
        Self {
            tx,
            listener: Arc::new(RwLock::new(None)),
            event_tx: None,
        }
    }

    /// Also broadcast every change as a [`SyncEvent::SubscriptionsChanged`].
    pub fn with_event_tx(mut self, tx: broadcast::Sender<SyncEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn set_listener(&self, listener: impl SubscriptionsChangedListener) {
        *self
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(listener));
    }

    pub fn clear_listener(&self) {
        *self
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Queue a notification for the listener registered right now.
    pub fn notify(&self, interests: Interests) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(SyncEvent::SubscriptionsChanged {
                interests: interests.clone(),
                timestamp: Utc::now(),
            });
        }

        let listener = self
            .listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if self
            .tx
            .send(Notification::Changed {
                listener,
                interests,
            })
            .is_err()
        {
            tracing::warn!("Notification task has stopped, dropping subscriptions change");
        }
    }

    /// Wait until every notification raised so far has been delivered.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(Notification::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

async fn dispatch(mut rx: mpsc::UnboundedReceiver<Notification>) {
    while let Some(notification) = rx.recv().await {
        match notification {
            Notification::Changed {
                listener: Some(listener),
                interests,
            } => {
                let delivered = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    listener.on_subscriptions_changed(&interests)
                }));
                if delivered.is_err() {
                    tracing::error!("Subscriptions changed listener panicked");
                }
            }
            Notification::Changed { listener: None, .. } => {}
            Notification::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("Notification task finished");
}

//! The consumer-facing push notifications handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actors::{
    Notifier, SharedDeviceState, SubscriptionsChangedListener, SyncEngine, SyncSystem,
    start_sync_system,
};
use sync_core::{
    DeviceState, DeviceStateStore, Interests, InterestError, JobQueue, MAX_INTERESTS,
    RegistryApi, RetryStrategy, SyncEvent, SyncJob, validate_interest, validate_interests,
};
use tokio::sync::broadcast;

use crate::error::ApiError;

const EVENT_CAPACITY: usize = 1024;

/// Options for building a [`PushNotifications`] from its parts.
#[derive(Debug, Clone, Default)]
pub struct InstanceOptions {
    pub known_previous_device_ids: Vec<String>,
    pub retry: RetryStrategy,
}

/// Handle to the interest sync engine of one device.
///
/// Every mutation is applied to local state first and then queued for
/// replication, under the device state lock, so the queue order always
/// matches the order of local changes.
pub struct PushNotifications<S> {
    system: SyncSystem,
    state: SharedDeviceState<S>,
    notifier: Notifier,
    event_tx: broadcast::Sender<SyncEvent>,
    known_previous_device_ids: Vec<String>,
    start_requested: AtomicBool,
}

impl<S: DeviceStateStore> PushNotifications<S> {
    /// Wire up the engine and start processing, replaying any jobs left in
    /// `queue` by a previous run.
    pub async fn new<R, Q>(
        registry: R,
        store: S,
        queue: Q,
        options: InstanceOptions,
    ) -> Result<Self, ApiError>
    where
        R: RegistryApi,
        Q: JobQueue,
    {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let notifier = Notifier::new().with_event_tx(event_tx.clone());
        let state = SharedDeviceState::new(store);

        let engine = SyncEngine::new(
            Arc::new(registry),
            state.clone(),
            Arc::new(queue),
            notifier.clone(),
        )
        .with_retry(options.retry)
        .with_event_tx(event_tx.clone());
        let system = start_sync_system(engine).await?;

        Ok(Self {
            system,
            state,
            notifier,
            event_tx,
            known_previous_device_ids: options.known_previous_device_ids,
            start_requested: AtomicBool::new(false),
        })
    }

    /// Register this device with the given push token.
    ///
    /// Registration happens once per process. A device that is already
    /// registered only has its token refreshed if it changed.
    pub async fn start(&self, token: &str) -> Result<(), ApiError> {
        let store = self.state.lock().await;
        let device = store.load().await?;

        if device.is_started() {
            if device.push_token.as_deref() != Some(token) {
                self.system.enqueue(SyncJob::refresh_token(token)).await?;
            }
            return Ok(());
        }

        if self.start_requested.swap(true, Ordering::SeqCst) {
            tracing::debug!("Start already requested in this process");
            return Ok(());
        }
        tracing::info!("Starting device registration");
        self.system
            .enqueue(SyncJob::start(token, self.known_previous_device_ids.clone()))
            .await?;
        Ok(())
    }

    /// Replace the push token of the registered device.
    ///
    /// Before the device has started this only does something if a start
    /// is already queued in this process.
    pub async fn refresh_token(&self, token: &str) -> Result<(), ApiError> {
        let store = self.state.lock().await;
        let device = store.load().await?;

        if !device.is_started() {
            // A queued start registers with the old token, so the refresh
            // follows it through the queue.
            if self.start_requested.load(Ordering::SeqCst) {
                self.system.enqueue(SyncJob::refresh_token(token)).await?;
            } else {
                tracing::debug!("Device not started, token will be sent on start");
            }
            return Ok(());
        }
        if device.push_token.as_deref() == Some(token) {
            return Ok(());
        }
        self.system.enqueue(SyncJob::refresh_token(token)).await?;
        Ok(())
    }

    pub async fn subscribe(&self, interest: &str) -> Result<(), ApiError> {
        validate_interest(interest)?;
        self.mutate(SyncJob::subscribe(interest)).await
    }

    pub async fn unsubscribe(&self, interest: &str) -> Result<(), ApiError> {
        validate_interest(interest)?;
        self.mutate(SyncJob::unsubscribe(interest)).await
    }

    /// Replace the whole interest set.
    pub async fn set_subscriptions<I, T>(&self, interests: I) -> Result<(), ApiError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let interests: Interests = interests.into_iter().map(Into::into).collect();
        validate_interests(&interests)?;
        self.mutate(SyncJob::SetSubscriptions { interests }).await
    }

    pub async fn unsubscribe_all(&self) -> Result<(), ApiError> {
        self.mutate(SyncJob::SetSubscriptions {
            interests: Interests::new(),
        })
        .await
    }

    /// Apply `job` locally and queue it if it changed anything.
    async fn mutate(&self, job: SyncJob) -> Result<(), ApiError> {
        let store = self.state.lock().await;
        let mut device: DeviceState = store.load().await?;

        let mut interests = device.interests.clone();
        job.apply_to(&mut interests);
        if interests == device.interests {
            tracing::debug!("{} leaves interests unchanged", job);
            return Ok(());
        }
        if interests.len() > MAX_INTERESTS {
            return Err(InterestError::TooMany(interests.len()).into());
        }

        let previous = device.clone();
        device.interests = interests.clone();
        store.replace(&device).await?;
        if let Err(e) = self.system.enqueue(job).await {
            // Local state may only run ahead of the registry by what is queued.
            if let Err(restore) = store.replace(&previous).await {
                tracing::error!("Failed to roll back local interests: {}", restore);
            }
            return Err(e.into());
        }
        self.notifier.notify(interests);
        Ok(())
    }

    /// Interests this device is subscribed to locally.
    pub async fn get_subscriptions(&self) -> Result<Interests, ApiError> {
        Ok(self.state.snapshot().await?.interests)
    }

    /// Registry-assigned device ID, once the device has started.
    pub async fn device_id(&self) -> Result<Option<String>, ApiError> {
        Ok(self.state.snapshot().await?.device_id)
    }

    pub fn set_on_subscriptions_changed_listener(
        &self,
        listener: impl SubscriptionsChangedListener,
    ) {
        self.notifier.set_listener(listener);
    }

    pub fn clear_on_subscriptions_changed_listener(&self) {
        self.notifier.clear_listener();
    }

    /// Subscribe to sync events.
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    /// Jobs not yet replicated, head first.
    pub async fn pending_jobs(&self) -> Result<Vec<SyncJob>, ApiError> {
        Ok(self.system.pending_jobs().await?)
    }

    /// Wait until every queued job has been processed and every resulting
    /// notification delivered.
    pub async fn flush(&self) -> Result<(), ApiError> {
        self.system.flush().await?;
        self.notifier.flush().await;
        Ok(())
    }

    /// Stop processing. Unprocessed jobs stay in the durable queue.
    pub async fn shutdown(self) {
        tracing::info!("Shutting down push notifications");
        self.system.shutdown().await;
        self.notifier.flush().await;
    }
}

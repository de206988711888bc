//! Sequential processing of sync jobs against the registry.
//!
//! The engine is driven by the processor actor one job at a time. A job is
//! only popped from the durable queue once its effect has been replicated or
//! the registry rejected it outright, so a crash at any point replays it.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use sync_core::{
    Backoff, DeviceState, DeviceStateStore, Interests, JobQueue, QueueError, RegistrationResult,
    RegistryApi, RegistryError, RetryStrategy, StoreError, SyncEvent, SyncJob, replay_interests,
};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::listener::Notifier;
use crate::state::SharedDeviceState;

/// What happened to a job handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Replicated and popped.
    Completed,
    /// Rejected by the registry and popped without effect.
    Skipped { reason: String },
    /// Left in the queue until the device starts.
    Deferred,
}

/// Engine errors. None of them stop the processor.
///
/// Queue and device state failures are retried inside the engine until they
/// clear, so a job never leaves the queue because local storage hiccuped.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Device state error: {0}")]
    Store(#[from] StoreError),

    #[error("Device is not started")]
    NotStarted,

    #[error("No push token stored to recreate the device with")]
    MissingToken,

    #[error("Queue head is {found}, expected {expected}")]
    HeadMismatch { expected: String, found: String },
}

/// Replicates queued jobs to the registry.
pub struct SyncEngine<R, S, Q> {
    registry: Arc<R>,
    state: SharedDeviceState<S>,
    queue: Arc<Q>,
    notifier: Notifier,
    retry: RetryStrategy,
    backoff: Backoff,
    event_tx: Option<broadcast::Sender<SyncEvent>>,
}

impl<R, S, Q> SyncEngine<R, S, Q>
where
    R: RegistryApi,
    S: DeviceStateStore,
    Q: JobQueue,
{
    pub fn new(
        registry: Arc<R>,
        state: SharedDeviceState<S>,
        queue: Arc<Q>,
        notifier: Notifier,
    ) -> Self {
        Self {
            registry,
            state,
            queue,
            notifier,
            retry: RetryStrategy::infinite(),
            backoff: Backoff::default(),
            event_tx: None,
        }
    }

    /// Strategy handed to every registry call.
    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    /// Schedule used when a registry call gives up on a transient failure
    /// and the engine has to try again itself.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_event_tx(mut self, tx: broadcast::Sender<SyncEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn queue(&self) -> &Arc<Q> {
        &self.queue
    }

    pub fn state(&self) -> &SharedDeviceState<S> {
        &self.state
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    fn broadcast(&self, event: SyncEvent) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }


    /// Process a single job.
    pub async fn handle_job(&self, job: SyncJob) -> Result<JobOutcome, EngineError> {
        match job {
            SyncJob::Start {
                token,
                known_previous_device_ids,
            } => {
                self.process_start_job(&token, &known_previous_device_ids)
                    .await
            }
            job => {
                if !self.load_state().await.is_started() {
                    tracing::debug!("Device not started yet, deferring {}", job);
                    self.broadcast(SyncEvent::JobDeferred {
                        kind: job.kind().to_string(),
                        timestamp: Utc::now(),
                    });
                    return Ok(JobOutcome::Deferred);
                }
                self.process_job(&job).await
            }
        }
    }

    async fn process_start_job(
        &self,
        token: &str,
        known_previous_device_ids: &[String],
    ) -> Result<JobOutcome, EngineError> {
        let registration = self
            .register_until_success(token, known_previous_device_ids)
            .await;
        let device_id = registration.device_id.as_str();

        let registration_ref = &registration;
        let interests = self
            .retry_storage("Recording registration", move || {
                self.record_registration(token, registration_ref)
            })
            .await;

        tracing::info!("Device {} registered", device_id);
        self.broadcast(SyncEvent::DeviceRegistered {
            device_id: device_id.to_string(),
            timestamp: Utc::now(),
        });

        if interests != registration.initial_interests {
            if let Err(e) = self.push_interests(device_id, &interests).await {
                tracing::error!("Failed to push interests to device {}: {}", device_id, e);
            }
        }

        self.drain_through_start().await;
        self.broadcast(SyncEvent::JobCompleted {
            kind: "start".to_string(),
            timestamp: Utc::now(),
        });
        Ok(JobOutcome::Completed)
    }

    /// Store the new identity and the replayed interest set. Returns the set
    /// the registry should end up with.
    async fn record_registration(
        &self,
        token: &str,
        registration: &RegistrationResult,
    ) -> Result<Interests, EngineError> {
        let store = self.state.lock().await;
        let mut device = store.load().await?;
        device.device_id = Some(registration.device_id.clone());
        device.push_token = Some(token.to_string());

        let queued = self.queue.jobs().await?;
        let split = queued.iter().position(SyncJob::is_start).unwrap_or(queued.len());
        let (before_start, after_start) = queued.split_at(split);
        let interests = replay_interests(registration.initial_interests.clone(), before_start);

        // Mutations queued behind the start are already applied locally
        // and get replicated as ordinary jobs.
        let mut local = interests.clone();
        for job in after_start {
            job.apply_to(&mut local);
        }

        let changed = device.interests != local;
        device.interests = local.clone();
        store.replace(&device).await?;

        if changed {
            self.notifier.notify(local);
        }
        Ok(interests)
    }

    async fn process_job(&self, job: &SyncJob) -> Result<JobOutcome, EngineError> {
        let mut attempt = 0u32;
        loop {
            let device_id = self
                .load_state()
                .await
                .device_id
                .ok_or(EngineError::NotStarted)?;

            match self.dispatch(&device_id, job).await {
                Ok(()) => {
                    if let SyncJob::RefreshToken { new_token } = job {
                        let new_token = new_token.as_str();
                        self.retry_storage("Storing refreshed token", move || {
                            self.store_token(new_token)
                        })
                        .await;
                    }
                    self.pop_head(job).await?;
                    tracing::debug!("Completed {}", job);
                    self.broadcast(SyncEvent::JobCompleted {
                        kind: job.kind().to_string(),
                        timestamp: Utc::now(),
                    });
                    return Ok(JobOutcome::Completed);
                }
                Err(RegistryError::BadRequest(reason)) => {
                    tracing::error!("Registry rejected {}, skipping it: {}", job, reason);
                    return self.skip(job, reason).await;
                }
                Err(RegistryError::DeviceNotFound(message)) => {
                    tracing::warn!(
                        "Registry no longer knows device {} ({}), recreating it",
                        device_id,
                        message
                    );
                    if let Err(e) = self.recreate_device().await {
                        tracing::error!("Cannot recreate device, skipping {}: {}", job, e);
                        return self.skip(job, e.to_string()).await;
                    }
                }
                Err(RegistryError::Transport(message)) => {
                    let delay = self.backoff.delay(attempt);
                    tracing::warn!("{} failed: {}; retrying in {:?}", job, message, delay);
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    async fn skip(&self, job: &SyncJob, reason: String) -> Result<JobOutcome, EngineError> {
        self.pop_head(job).await?;
        self.broadcast(SyncEvent::JobSkipped {
            kind: job.kind().to_string(),
            reason: reason.clone(),
            timestamp: Utc::now(),
        });
        Ok(JobOutcome::Skipped { reason })
    }

    async fn dispatch(&self, device_id: &str, job: &SyncJob) -> Result<(), RegistryError> {
        match job {
            SyncJob::Subscribe { interest } => {
                self.registry
                    .add_interest(device_id, interest, &self.retry)
                    .await
            }
            SyncJob::Unsubscribe { interest } => {
                self.registry
                    .remove_interest(device_id, interest, &self.retry)
                    .await
            }
            SyncJob::SetSubscriptions { interests } => {
                self.registry
                    .set_subscriptions(device_id, interests, &self.retry)
                    .await
            }
            SyncJob::RefreshToken { new_token } => {
                self.registry
                    .refresh_token(device_id, new_token, &self.retry)
                    .await
            }
            // Registration goes through process_start_job.
            SyncJob::Start { .. } => Ok(()),
        }
    }

    /// Register the device again after the registry forgot it, then push the
    /// whole local interest set to the new device.
    async fn recreate_device(&self) -> Result<(), EngineError> {
        let previous = self.load_state().await;
        let token = previous.push_token.ok_or(EngineError::MissingToken)?;

        loop {
            let registration = self.register_until_success(&token, &[]).await;
            let device_id = registration.device_id.as_str();
            let token_ref = token.as_str();

            let interests = self
                .retry_storage("Recording recreated device", move || {
                    self.store_device(device_id, token_ref)
                })
                .await;

            tracing::info!("Device recreated as {}", device_id);
            self.broadcast(SyncEvent::DeviceRecreated {
                old_device_id: previous.device_id.clone(),
                new_device_id: device_id.to_string(),
                timestamp: Utc::now(),
            });

            if interests.is_empty() {
                return Ok(());
            }

            match self.set_subscriptions_with_backoff(device_id, &interests).await {
                Ok(()) => return Ok(()),
                Err(RegistryError::DeviceNotFound(message)) => {
                    tracing::warn!(
                        "Recreated device {} vanished again ({}), registering once more",
                        device_id,
                        message
                    );
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to restore interests on device {}: {}",
                        device_id,
                        e
                    );
                    return Ok(());
                }
            }
        }
    }

    /// Push the full local interest set to a freshly registered device.
    async fn push_interests(&self, device_id: &str, interests: &Interests) -> Result<(), EngineError> {
        match self.set_subscriptions_with_backoff(device_id, interests).await {
            Ok(()) => Ok(()),
            Err(RegistryError::DeviceNotFound(message)) => {
                tracing::warn!(
                    "Device {} not found while pushing interests ({}), recreating it",
                    device_id,
                    message
                );
                self.recreate_device().await
            }
            Err(e) => {
                tracing::error!("Failed to push interests to device {}: {}", device_id, e);
                Ok(())
            }
        }
    }

    async fn set_subscriptions_with_backoff(
        &self,
        device_id: &str,
        interests: &Interests,
    ) -> Result<(), RegistryError> {
        self.retry_transport("set_subscriptions", move || {
            self.registry
                .set_subscriptions(device_id, interests, &self.retry)
        })
        .await
    }

    /// Keep registering until the registry hands out a device ID.
    async fn register_until_success(
        &self,
        token: &str,
        known_previous_device_ids: &[String],
    ) -> RegistrationResult {
        let mut attempt = 0u32;
        loop {
            match self
                .registry
                .register_device(token, known_previous_device_ids, &self.retry)
                .await
            {
                Ok(registration) => return registration,
                Err(e) => {
                    let delay = self.backoff.delay(attempt);
                    tracing::warn!("Device registration failed: {}; retrying in {:?}", e, delay);
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    /// Re-attempt `call` while it fails with a transport error.
    async fn retry_transport<T, F, Fut>(
        &self,
        operation: &str,
        mut call: F,
    ) -> Result<T, RegistryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RegistryError>>,
    {
        let mut attempt = 0u32;
        loop {
            match call().await {
                Err(RegistryError::Transport(message)) => {
                    let delay = self.backoff.delay(attempt);
                    tracing::warn!("{} failed: {}; retrying in {:?}", operation, message, delay);
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
                other => return other,
            }
        }
    }

    /// Re-attempt a local storage step until it succeeds.
    async fn retry_storage<T, E, F, Fut>(&self, operation: &str, mut step: F) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0u32;
        loop {
            match step().await {
                Ok(value) => return value,
                Err(e) => {
                    let delay = self.backoff.delay(attempt);
                    tracing::error!("{} failed: {}; retrying in {:?}", operation, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    async fn load_state(&self) -> DeviceState {
        let state = &self.state;
        self.retry_storage("Loading device state", move || state.snapshot())
            .await
    }

    async fn store_token(&self, token: &str) -> Result<(), StoreError> {
        let store = self.state.lock().await;
        let mut device = store.load().await?;
        device.push_token = Some(token.to_string());
        store.replace(&device).await
    }

    /// Point the stored state at a new device ID, keeping local interests.
    async fn store_device(&self, device_id: &str, token: &str) -> Result<Interests, StoreError> {
        let store = self.state.lock().await;
        let mut device = store.load().await?;
        device.device_id = Some(device_id.to_string());
        device.push_token = Some(token.to_string());
        store.replace(&device).await?;
        Ok(device.interests)
    }

    async fn peek_head(&self) -> Option<SyncJob> {
        let queue = self.queue.as_ref();
        self.retry_storage("Reading job queue head", move || queue.peek())
            .await
    }

    async fn remove_head(&self) {
        let queue = self.queue.as_ref();
        self.retry_storage("Removing job queue head", move || pop_if_present(queue))
            .await
    }

    /// Remove `job` from the head of the queue.
    ///
    /// Refuses when the head is a different job, so an unreplicated job is
    /// never discarded in place of the one that completed.
    async fn pop_head(&self, job: &SyncJob) -> Result<(), EngineError> {
        match self.peek_head().await {
            None => {
                tracing::warn!("Job queue empty while completing {}", job);
                Ok(())
            }
            Some(head) if &head != job => Err(EngineError::HeadMismatch {
                expected: job.to_string(),
                found: head.to_string(),
            }),
            Some(_) => {
                self.remove_head().await;
                Ok(())
            }
        }
    }

    /// Pop every job up to and including the first `Start`.
    async fn drain_through_start(&self) {
        while let Some(job) = self.peek_head().await {
            self.remove_head().await;
            if job.is_start() {
                return;
            }
        }
        tracing::warn!("No start job left in the queue to drain through");
    }
}

async fn pop_if_present<Q: JobQueue>(queue: &Q) -> Result<(), QueueError> {
    match queue.pop().await {
        Ok(_) | Err(QueueError::Empty) => Ok(()),
        Err(e) => Err(e),
    }
}

//! Contracts for the collaborators the sync engine drives.
//!
//! All methods return `Send` futures so implementations can be driven from
//! inside actors.

use std::future::Future;

use crate::{
    DeviceState, Interests, QueueError, RegistrationResult, RegistryError, RetryStrategy,
    StoreError, SyncJob,
};

/// Durable FIFO of pending sync jobs.
///
/// A job for which `push` returned `Ok` must be visible to `peek` and `jobs`
/// after a process restart until it is popped.
pub trait JobQueue: Send + Sync + 'static {
    /// Append a job to the tail, returning once it is durably recorded.
    fn push(&self, job: &SyncJob) -> impl Future<Output = Result<(), QueueError>> + Send;

    /// Get the head job without removing it.
    fn peek(&self) -> impl Future<Output = Result<Option<SyncJob>, QueueError>> + Send;

    /// Remove and return the head job. Fails with `QueueError::Empty`.
    fn pop(&self) -> impl Future<Output = Result<SyncJob, QueueError>> + Send;

    /// Snapshot of every queued job, head to tail.
    fn jobs(&self) -> impl Future<Output = Result<Vec<SyncJob>, QueueError>> + Send;

    /// Number of queued jobs.
    fn len(&self) -> impl Future<Output = Result<usize, QueueError>> + Send {
        async move { Ok(self.jobs().await?.len()) }
    }

    /// Check if nothing is queued.
    fn is_empty(&self) -> impl Future<Output = Result<bool, QueueError>> + Send {
        async move { Ok(self.peek().await?.is_none()) }
    }
}

/// Durable record of the device's identity and interests.
pub trait DeviceStateStore: Send + Sync + 'static {
    /// Load the current state. A store that was never written yields the default.
    fn load(&self) -> impl Future<Output = Result<DeviceState, StoreError>> + Send;

    /// Replace the whole state.
    fn replace(&self, state: &DeviceState) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Remote device registry.
///
/// Every call blocks according to `retry`: transient failures are retried
/// inside the implementation and only `BadRequest` / `DeviceNotFound` (or
/// `Transport` once the strategy gives up) come back.
pub trait RegistryApi: Send + Sync + 'static {
    fn register_device(
        &self,
        token: &str,
        known_previous_device_ids: &[String],
        retry: &RetryStrategy,
    ) -> impl Future<Output = Result<RegistrationResult, RegistryError>> + Send;

    fn set_subscriptions(
        &self,
        device_id: &str,
        interests: &Interests,
        retry: &RetryStrategy,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send;

    fn add_interest(
        &self,
        device_id: &str,
        interest: &str,
        retry: &RetryStrategy,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send;

    fn remove_interest(
        &self,
        device_id: &str,
        interest: &str,
        retry: &RetryStrategy,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send;

    fn refresh_token(
        &self,
        device_id: &str,
        new_token: &str,
        retry: &RetryStrategy,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send;
}

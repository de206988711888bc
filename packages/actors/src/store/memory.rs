//! In-memory stores for tests and embedding. Nothing survives the process.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use sync_core::{DeviceState, DeviceStateStore, JobQueue, QueueError, StoreError, SyncJob};

#[derive(Debug, Default)]
pub struct MemoryJobQueue {
    jobs: Mutex<VecDeque<SyncJob>>,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue that already holds `jobs`, as if left over from a
    /// previous run.
    pub fn with_jobs(jobs: impl IntoIterator<Item = SyncJob>) -> Self {
        Self {
            jobs: Mutex::new(jobs.into_iter().collect()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<SyncJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl JobQueue for MemoryJobQueue {
    async fn push(&self, job: &SyncJob) -> Result<(), QueueError> {
        self.lock().push_back(job.clone());
        Ok(())
    }

    async fn peek(&self) -> Result<Option<SyncJob>, QueueError> {
        Ok(self.lock().front().cloned())
    }

    async fn pop(&self) -> Result<SyncJob, QueueError> {
        self.lock().pop_front().ok_or(QueueError::Empty)
    }

    async fn jobs(&self) -> Result<Vec<SyncJob>, QueueError> {
        Ok(self.lock().iter().cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryDeviceStateStore {
    state: Mutex<DeviceState>,
}

impl MemoryDeviceStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: DeviceState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl DeviceStateStore for MemoryDeviceStateStore {
    async fn load(&self) -> Result<DeviceState, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn replace(&self, state: &DeviceState) -> Result<(), StoreError> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state.clone();
        Ok(())
    }
}

//! File-backed durable stores.

use std::collections::VecDeque;
use std::path::Path;

use sync_core::{DeviceState, DeviceStateStore, JobQueue, QueueError, StoreError, SyncJob};
use tokio::sync::Mutex;

use crate::persistence::JsonFile;

/// Job queue kept in a single JSON file.
///
/// The whole queue is rewritten atomically on every change. If a write fails
/// the in-memory copy is rolled back so it never runs ahead of the disk.
pub struct FileJobQueue {
    file: JsonFile,
    jobs: Mutex<VecDeque<SyncJob>>,
}

impl FileJobQueue {
    /// Open the queue stored at `path`, starting empty if it doesn't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let file = JsonFile::new(path);
        let jobs: VecDeque<SyncJob> = file.load().await?.unwrap_or_default();
        tracing::info!("Opened job queue {:?} with {} jobs", file.path(), jobs.len());
        Ok(Self {
            file,
            jobs: Mutex::new(jobs),
        })
    }
}

impl JobQueue for FileJobQueue {
    async fn push(&self, job: &SyncJob) -> Result<(), QueueError> {
        let mut jobs = self.jobs.lock().await;
        jobs.push_back(job.clone());
        if let Err(e) = self.file.save(&*jobs).await {
            jobs.pop_back();
            return Err(e.into());
        }
        Ok(())
    }

    async fn peek(&self) -> Result<Option<SyncJob>, QueueError> {
        Ok(self.jobs.lock().await.front().cloned())
    }

    async fn pop(&self) -> Result<SyncJob, QueueError> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs.pop_front().ok_or(QueueError::Empty)?;
        if let Err(e) = self.file.save(&*jobs).await {
            jobs.push_front(job);
            return Err(e.into());
        }
        Ok(job)
    }

    async fn jobs(&self) -> Result<Vec<SyncJob>, QueueError> {
        Ok(self.jobs.lock().await.iter().cloned().collect())
    }

    async fn len(&self) -> Result<usize, QueueError> {
        Ok(self.jobs.lock().await.len())
    }
}

/// Device state kept in a single JSON file.
pub struct FileDeviceStateStore {
    file: JsonFile,
}

impl FileDeviceStateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    /// Forget everything stored about the device.
    pub async fn clear(&self) -> Result<(), StoreError> {
        Ok(self.file.delete().await?)
    }
}

impl DeviceStateStore for FileDeviceStateStore {
    async fn load(&self) -> Result<DeviceState, StoreError> {
        Ok(self.file.load().await?.unwrap_or_default())
    }

    async fn replace(&self, state: &DeviceState) -> Result<(), StoreError> {
        Ok(self.file.save(state).await?)
    }
}

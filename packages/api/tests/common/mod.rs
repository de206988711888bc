#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use api::{InstanceOptions, Interests, PushNotifications};
use actors::{FileDeviceStateStore, FileJobQueue, MemoryDeviceStateStore, MemoryJobQueue};
use sync_core::{
    JobQueue, QueueError, RegistrationResult, RegistryApi, RegistryError, RetryStrategy, SyncJob,
};

/// Registry double shared between a test and the instance under test.
#[derive(Clone, Default)]
pub struct RecordingRegistry {
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingRegistry {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn join(interests: &Interests) -> String {
    interests.iter().cloned().collect::<Vec<_>>().join(",")
}

impl RegistryApi for RecordingRegistry {
    async fn register_device(
        &self,
        token: &str,
        _known_previous_device_ids: &[String],
        _retry: &RetryStrategy,
    ) -> Result<RegistrationResult, RegistryError> {
        self.record(format!("register {}", token));
        Ok(RegistrationResult::new("device-1"))
    }

    async fn set_subscriptions(
        &self,
        device_id: &str,
        interests: &Interests,
        _retry: &RetryStrategy,
    ) -> Result<(), RegistryError> {
        self.record(format!("set {} [{}]", device_id, join(interests)));
        Ok(())
    }

    async fn add_interest(
        &self,
        device_id: &str,
        interest: &str,
        _retry: &RetryStrategy,
    ) -> Result<(), RegistryError> {
        self.record(format!("add {} {}", device_id, interest));
        Ok(())
    }

    async fn remove_interest(
        &self,
        device_id: &str,
        interest: &str,
        _retry: &RetryStrategy,
    ) -> Result<(), RegistryError> {
        self.record(format!("remove {} {}", device_id, interest));
        Ok(())
    }

    async fn refresh_token(
        &self,
        device_id: &str,
        new_token: &str,
        _retry: &RetryStrategy,
    ) -> Result<(), RegistryError> {
        self.record(format!("token {} {}", device_id, new_token));
        Ok(())
    }
}

pub fn interests(items: &[&str]) -> Interests {
    items.iter().map(|s| s.to_string()).collect()
}

pub async fn setup_memory_instance(
    registry: RecordingRegistry,
) -> PushNotifications<MemoryDeviceStateStore> {
    PushNotifications::new(
        registry,
        MemoryDeviceStateStore::new(),
        MemoryJobQueue::new(),
        InstanceOptions::default(),
    )
    .await
    .expect("instance should start")
}

pub async fn setup_file_instance(
    registry: RecordingRegistry,
    dir: &std::path::Path,
) -> PushNotifications<FileDeviceStateStore> {
    PushNotifications::new(
        registry,
        FileDeviceStateStore::new(dir.join("device.json")),
        FileJobQueue::open(dir.join("jobs.json")).await.unwrap(),
        InstanceOptions::default(),
    )
    .await
    .expect("instance should start")
}

/// Record every subscriptions change the instance reports.
pub fn record_changes<S: sync_core::DeviceStateStore>(
    instance: &PushNotifications<S>,
) -> Arc<Mutex<Vec<Interests>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    instance.set_on_subscriptions_changed_listener(move |interests: &Interests| {
        sink.lock().unwrap().push(interests.clone());
    });
    seen
}

/// In-memory queue that rejects pushes while its switch is on.
pub struct FailingQueue {
    inner: MemoryJobQueue,
    failing: Arc<AtomicBool>,
}

/// Build a [`FailingQueue`] and the switch that controls it.
pub fn failing_queue() -> (FailingQueue, Arc<AtomicBool>) {
    let failing = Arc::new(AtomicBool::new(false));
    let queue = FailingQueue {
        inner: MemoryJobQueue::new(),
        failing: failing.clone(),
    };
    (queue, failing)
}

impl JobQueue for FailingQueue {
    async fn push(&self, job: &SyncJob) -> Result<(), QueueError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(QueueError::Storage("no space left on device".into()));
        }
        self.inner.push(job).await
    }

    async fn peek(&self) -> Result<Option<SyncJob>, QueueError> {
        self.inner.peek().await
    }

    async fn pop(&self) -> Result<SyncJob, QueueError> {
        self.inner.pop().await
    }

    async fn jobs(&self) -> Result<Vec<SyncJob>, QueueError> {
        self.inner.jobs().await
    }
}

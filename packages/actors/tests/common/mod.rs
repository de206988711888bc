#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actors::{
    MemoryDeviceStateStore, MemoryJobQueue, Notifier, SharedDeviceState, SyncEngine,
};
use sync_core::{
    Backoff, DeviceState, DeviceStateStore, Interests, JobQueue, QueueError, RegistrationResult,
    RegistryApi, RegistryError, RetryStrategy, StoreError, SyncJob,
};

/// A registry call as observed by [`MockRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Register { token: String, known: Vec<String> },
    SetSubscriptions { device_id: String, interests: Interests },
    AddInterest { device_id: String, interest: String },
    RemoveInterest { device_id: String, interest: String },
    RefreshToken { device_id: String, token: String },
}

/// Registry double that records calls and replays scripted failures.
#[derive(Default)]
pub struct MockRegistry {
    calls: Mutex<Vec<Call>>,
    registrations: Mutex<VecDeque<RegistrationResult>>,
    registration_failures: Mutex<VecDeque<RegistryError>>,
    failures: Mutex<VecDeque<RegistryError>>,
    registered: Mutex<u32>,
}

impl MockRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer the next registration with `result` instead of a generated ID.
    pub fn script_registration(&self, result: RegistrationResult) {
        self.registrations.lock().unwrap().push_back(result);
    }

    /// Fail the next registration attempt.
    pub fn fail_next_registration(&self, error: RegistryError) {
        self.registration_failures.lock().unwrap().push_back(error);
    }

    /// Fail the next non-registration call.
    pub fn fail_next(&self, error: RegistryError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn registration_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Register { .. }))
            .count()
    }

    fn record(&self, call: Call) -> Result<(), RegistryError> {
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl RegistryApi for MockRegistry {
    async fn register_device(
        &self,
        token: &str,
        known_previous_device_ids: &[String],
        _retry: &RetryStrategy,
    ) -> Result<RegistrationResult, RegistryError> {
        self.calls.lock().unwrap().push(Call::Register {
            token: token.to_string(),
            known: known_previous_device_ids.to_vec(),
        });
        if let Some(error) = self.registration_failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        if let Some(result) = self.registrations.lock().unwrap().pop_front() {
            return Ok(result);
        }
        let mut registered = self.registered.lock().unwrap();
        *registered += 1;
        Ok(RegistrationResult::new(format!("device-{}", registered)))
    }

    async fn set_subscriptions(
        &self,
        device_id: &str,
        interests: &Interests,
        _retry: &RetryStrategy,
    ) -> Result<(), RegistryError> {
        self.record(Call::SetSubscriptions {
            device_id: device_id.to_string(),
            interests: interests.clone(),
        })
    }

    async fn add_interest(
        &self,
        device_id: &str,
        interest: &str,
        _retry: &RetryStrategy,
    ) -> Result<(), RegistryError> {
        self.record(Call::AddInterest {
            device_id: device_id.to_string(),
            interest: interest.to_string(),
        })
    }

    async fn remove_interest(
        &self,
        device_id: &str,
        interest: &str,
        _retry: &RetryStrategy,
    ) -> Result<(), RegistryError> {
        self.record(Call::RemoveInterest {
            device_id: device_id.to_string(),
            interest: interest.to_string(),
        })
    }

    async fn refresh_token(
        &self,
        device_id: &str,
        new_token: &str,
        _retry: &RetryStrategy,
    ) -> Result<(), RegistryError> {
        self.record(Call::RefreshToken {
            device_id: device_id.to_string(),
            token: new_token.to_string(),
        })
    }
}

pub type TestEngine = SyncEngine<MockRegistry, MemoryDeviceStateStore, MemoryJobQueue>;

pub fn interests(items: &[&str]) -> Interests {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn fast_backoff() -> Backoff {
    Backoff::new(Duration::from_millis(1), Duration::from_millis(5))
}

/// State of a device that already went through `Start`.
pub fn started_state(device_id: &str, token: &str, items: &[&str]) -> DeviceState {
    DeviceState {
        device_id: Some(device_id.to_string()),
        push_token: Some(token.to_string()),
        interests: interests(items),
    }
}

/// Build an engine over in-memory stores. `jobs` are already queued.
pub fn setup_engine(
    registry: Arc<MockRegistry>,
    state: DeviceState,
    jobs: Vec<SyncJob>,
) -> TestEngine {
    SyncEngine::new(
        registry,
        SharedDeviceState::new(MemoryDeviceStateStore::with_state(state)),
        Arc::new(MemoryJobQueue::with_jobs(jobs)),
        Notifier::new(),
    )
    .with_backoff(fast_backoff())
}

/// Record every notification the engine raises.
pub fn record_notifications(notifier: &Notifier) -> Arc<Mutex<Vec<Interests>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    notifier.set_listener(move |interests: &Interests| {
        sink.lock().unwrap().push(interests.clone());
    });
    seen
}

/// Take one failure off `counter` if any are left.
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Device state store whose first few loads or replaces fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryDeviceStateStore,
    failing_loads: AtomicUsize,
    failing_replaces: AtomicUsize,
}

impl FlakyStore {
    pub fn new(state: DeviceState) -> Self {
        Self {
            inner: MemoryDeviceStateStore::with_state(state),
            ..Default::default()
        }
    }

    pub fn failing_loads(self, count: usize) -> Self {
        self.failing_loads.store(count, Ordering::SeqCst);
        self
    }

    pub fn failing_replaces(self, count: usize) -> Self {
        self.failing_replaces.store(count, Ordering::SeqCst);
        self
    }
}

impl DeviceStateStore for FlakyStore {
    async fn load(&self) -> Result<DeviceState, StoreError> {
        if take_failure(&self.failing_loads) {
            return Err(StoreError::Storage("disk unavailable".into()));
        }
        self.inner.load().await
    }

    async fn replace(&self, state: &DeviceState) -> Result<(), StoreError> {
        if take_failure(&self.failing_replaces) {
            return Err(StoreError::Storage("disk full".into()));
        }
        self.inner.replace(state).await
    }
}

/// Job queue whose next few peeks or pops fail.
#[derive(Default)]
pub struct FlakyQueue {
    inner: MemoryJobQueue,
    failing_peeks: AtomicUsize,
    failing_pops: AtomicUsize,
}

impl FlakyQueue {
    pub fn new(jobs: Vec<SyncJob>) -> Self {
        Self {
            inner: MemoryJobQueue::with_jobs(jobs),
            ..Default::default()
        }
    }

    pub fn fail_next_peeks(&self, count: usize) {
        self.failing_peeks.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_pops(&self, count: usize) {
        self.failing_pops.store(count, Ordering::SeqCst);
    }
}

impl JobQueue for FlakyQueue {
    async fn push(&self, job: &SyncJob) -> Result<(), QueueError> {
        self.inner.push(job).await
    }

    async fn peek(&self) -> Result<Option<SyncJob>, QueueError> {
        if take_failure(&self.failing_peeks) {
            return Err(QueueError::Storage("read failed".into()));
        }
        self.inner.peek().await
    }

    async fn pop(&self) -> Result<SyncJob, QueueError> {
        if take_failure(&self.failing_pops) {
            return Err(QueueError::Storage("write failed".into()));
        }
        self.inner.pop().await
    }

    async fn jobs(&self) -> Result<Vec<SyncJob>, QueueError> {
        self.inner.jobs().await
    }
}

pub type FlakyEngine = SyncEngine<MockRegistry, FlakyStore, FlakyQueue>;

/// Build an engine over stores that fail on demand.
pub fn setup_flaky_engine(
    registry: Arc<MockRegistry>,
    store: FlakyStore,
    jobs: Vec<SyncJob>,
) -> FlakyEngine {
    SyncEngine::new(
        registry,
        SharedDeviceState::new(store),
        Arc::new(FlakyQueue::new(jobs)),
        Notifier::new(),
    )
    .with_backoff(fast_backoff())
}

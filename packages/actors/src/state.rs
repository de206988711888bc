//! Guarded access to the device state store.

use std::sync::Arc;

use sync_core::{DeviceState, DeviceStateStore, StoreError};
use tokio::sync::{Mutex, MutexGuard};

/// Device state store shared between the engine and the public API.
///
/// Every read-modify-write of the device state must happen while holding the
/// guard returned by [`SharedDeviceState::lock`].
pub struct SharedDeviceState<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedDeviceState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: DeviceStateStore> SharedDeviceState<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Acquire exclusive access to the store.
    pub async fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock().await
    }

    /// Load a copy of the current state.
    pub async fn snapshot(&self) -> Result<DeviceState, StoreError> {
        self.lock().await.load().await
    }
}

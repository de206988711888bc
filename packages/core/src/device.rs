//! Device identity and subscription state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A set of interest names. Ordered so persisted state is stable.
pub type Interests = BTreeSet<String>;

/// Locally held state of this device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceState {
    /// Registry-assigned device ID, present once the device has started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Push token the device was last registered with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
    /// Interests the device is subscribed to.
    pub interests: Interests,
}

impl DeviceState {
    /// Check if the device has been registered.
    pub fn is_started(&self) -> bool {
        self.device_id.is_some()
    }
}

/// Result of a successful device registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResult {
    pub device_id: String,
    #[serde(default)]
    pub initial_interests: Interests,
}

impl RegistrationResult {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            initial_interests: Interests::new(),
        }
    }

    pub fn with_initial_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.initial_interests = interests.into_iter().map(Into::into).collect();
        self
    }
}

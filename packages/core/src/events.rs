//! Event types for real-time updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Interests;

/// Events emitted by the sync engine and the public API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    /// The device was registered by a `Start` job.
    DeviceRegistered {
        device_id: String,
        timestamp: DateTime<Utc>,
    },
    /// The registry forgot the device and it was registered again.
    DeviceRecreated {
        old_device_id: Option<String>,
        new_device_id: String,
        timestamp: DateTime<Utc>,
    },
    /// A job was replicated and removed from the queue.
    JobCompleted {
        kind: String,
        timestamp: DateTime<Utc>,
    },
    /// A job was rejected by the registry and dropped.
    JobSkipped {
        kind: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    /// A job arrived before the device started and stays queued.
    JobDeferred {
        kind: String,
        timestamp: DateTime<Utc>,
    },
    /// The local interest set changed.
    SubscriptionsChanged {
        interests: Interests,
        timestamp: DateTime<Utc>,
    },
}

impl SyncEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            SyncEvent::DeviceRegistered { timestamp, .. } => *timestamp,
            SyncEvent::DeviceRecreated { timestamp, .. } => *timestamp,
            SyncEvent::JobCompleted { timestamp, .. } => *timestamp,
            SyncEvent::JobSkipped { timestamp, .. } => *timestamp,
            SyncEvent::JobDeferred { timestamp, .. } => *timestamp,
            SyncEvent::SubscriptionsChanged { timestamp, .. } => *timestamp,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            SyncEvent::DeviceRegistered { device_id, .. } => {
                format!("Device {} registered", device_id)
            }
            SyncEvent::DeviceRecreated {
                old_device_id,
                new_device_id,
                ..
            } => {
                let old = old_device_id.as_deref().unwrap_or("unknown");
                format!("Device {} recreated as {}", old, new_device_id)
            }
            SyncEvent::JobCompleted { kind, .. } => format!("Job {} completed", kind),
            SyncEvent::JobSkipped { kind, reason, .. } => {
                format!("Job {} skipped: {}", kind, reason)
            }
            SyncEvent::JobDeferred { kind, .. } => {
                format!("Job {} deferred until start", kind)
            }
            SyncEvent::SubscriptionsChanged { interests, .. } => {
                format!("Subscriptions changed ({} interests)", interests.len())
            }
        }
    }
}

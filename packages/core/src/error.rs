//! Error types shared by the collaborator contracts.

use thiserror::Error;

/// Failure classes surfaced by the remote registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The request was rejected as invalid and will never succeed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The registry has no record of the device.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// Network or server hiccup that outlived the retry strategy.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Job queue errors.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job queue is empty")]
    Empty,

    #[error("queue storage error: {0}")]
    Storage(String),

    #[error("queue serialization error: {0}")]
    Serialization(String),
}

/// Device state store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("device state storage error: {0}")]
    Storage(String),

    #[error("device state serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for QueueError {
    fn from(e: serde_json::Error) -> Self {
        QueueError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

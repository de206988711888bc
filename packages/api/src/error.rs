//! Errors surfaced by the public API.

use actors::ActorError;
use db::DbError;
use registry::ClientError;
use sync_core::{InterestError, QueueError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid interest: {0}")]
    InvalidInterest(#[from] InterestError),

    #[error("Device state error: {0}")]
    Store(#[from] StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Sync system error: {0}")]
    Actor(#[from] ActorError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Registry client error: {0}")]
    Client(#[from] ClientError),

    #[error("Configuration error: {0}")]
    Config(String),
}

//! Public API for keeping a device's push interests in sync.
//!
//! This crate ties the pieces together:
//! - [`PushNotifications`] for subscribing and unsubscribing
//! - [`ClientConfig`] for configuration, including from the environment
//! - [`connect_files`] / [`connect_surreal`] to start an instance

mod config;
mod error;
mod init;
mod instance;

pub use config::{ClientConfig, DEFAULT_DATA_DIR, StorageBackend};
pub use error::ApiError;
pub use init::{FilePushNotifications, SurrealPushNotifications, connect_files, connect_surreal};
pub use instance::{InstanceOptions, PushNotifications};

// Re-export core types for convenience
pub use actors::SubscriptionsChangedListener;
pub use sync_core::{Interests, InterestError, RetryStrategy, SyncEvent, SyncJob};

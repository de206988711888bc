//! Core domain types for the interest sync system.
//!
//! This crate contains shared types used across all packages:
//! - `SyncJob` for queued mutations
//! - `DeviceState` and `RegistrationResult` for device identity
//! - `SyncEvent` for real-time updates
//! - The collaborator contracts (`JobQueue`, `DeviceStateStore`, `RegistryApi`)

mod device;
mod error;
mod events;
mod interest;
mod job;
mod retry;
mod traits;

pub use device::{DeviceState, Interests, RegistrationResult};
pub use error::{QueueError, RegistryError, StoreError};
pub use events::SyncEvent;
pub use interest::{InterestError, MAX_INTEREST_LENGTH, MAX_INTERESTS, validate_interest, validate_interests};
pub use job::{SyncJob, replay_interests};
pub use retry::{Backoff, RetryStrategy};
pub use traits::{DeviceStateStore, JobQueue, RegistryApi};

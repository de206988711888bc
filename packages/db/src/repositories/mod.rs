//! Repository implementations for database operations.

mod device_state_repo;
mod job_queue_repo;

pub use device_state_repo::SurrealDeviceStateStore;
pub use job_queue_repo::SurrealJobQueue;

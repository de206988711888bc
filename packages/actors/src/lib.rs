//! Actor system for interest synchronisation.
//!
//! # Architecture
//!
//! - `SyncHandler` - Front actor: records each job durably, then forwards it
//! - `SyncProcessor` - Owns the [`SyncEngine`] and processes one job at a time
//! - `Notifier` - Delivers subscription changes on a dedicated task
//!
//! # Usage
//!
//! ```ignore
//! use actors::{MemoryDeviceStateStore, MemoryJobQueue, Notifier, SharedDeviceState,
//!     SyncEngine, start_sync_system};
//!
//! let engine = SyncEngine::new(registry, SharedDeviceState::new(store), queue, Notifier::new());
//! let system = start_sync_system(engine).await?;
//! system.enqueue(SyncJob::subscribe("news")).await?;
//! ```

mod engine;
mod handler_actor;
mod listener;
mod messages;
mod persistence;
mod processor_actor;
mod state;
pub mod store;
mod system;

pub use engine::{EngineError, JobOutcome, SyncEngine};
pub use handler_actor::{SyncHandler, SyncHandlerArgs};
pub use listener::{Notifier, SubscriptionsChangedListener};
pub use messages::{ActorError, SyncHandlerMessage, SyncProcessorMessage};
pub use persistence::{JsonFile, PersistenceError};
pub use processor_actor::SyncProcessor;
pub use state::SharedDeviceState;
pub use store::{FileDeviceStateStore, FileJobQueue, MemoryDeviceStateStore, MemoryJobQueue};
pub use system::{SyncSystem, start_sync_system};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, concurrency};

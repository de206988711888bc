//! Message types for actor communication.

use ractor::RpcReplyPort;
use sync_core::SyncJob;

/// Messages for the SyncHandler.
#[derive(Debug)]
pub enum SyncHandlerMessage {
    /// Record a job durably and pass it on for processing.
    Enqueue {
        job: Box<SyncJob>,
        reply: RpcReplyPort<Result<(), String>>,
    },

    /// List jobs still waiting in the durable queue.
    PendingJobs {
        reply: RpcReplyPort<Result<Vec<SyncJob>, String>>,
    },

    /// Reply once every job enqueued so far has been processed.
    Flush { reply: RpcReplyPort<()> },

    /// Stop accepting jobs.
    Shutdown,
}

/// Messages for the SyncProcessor.
#[derive(Debug)]
pub enum SyncProcessorMessage {
    /// Process a job that is already in the durable queue.
    Process { job: Box<SyncJob> },

    /// Reply once every message ahead of this one has been handled.
    Flush { reply: RpcReplyPort<()> },

    /// Stop after the messages already in the mailbox.
    Shutdown,
}

/// Error type for actor operations.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    #[error("Failed to spawn actor: {0}")]
    Spawn(String),

    #[error("Failed to enqueue job: {0}")]
    Enqueue(String),

    #[error("Actor error: {0}")]
    Actor(String),
}

impl<T> From<ractor::MessagingErr<T>> for ActorError {
    fn from(e: ractor::MessagingErr<T>) -> Self {
        ActorError::Actor(e.to_string())
    }
}

//! Wiring of the handler and processor actors.

use std::sync::Arc;

use ractor::{Actor, ActorRef};
use sync_core::{DeviceStateStore, JobQueue, RegistryApi, SyncJob};
use tokio::task::JoinHandle;

use crate::engine::SyncEngine;
use crate::handler_actor::{SyncHandler, SyncHandlerArgs};
use crate::messages::{ActorError, SyncHandlerMessage, SyncProcessorMessage};
use crate::processor_actor::SyncProcessor;

/// Handle to a running sync system.
pub struct SyncSystem {
    handler: ActorRef<SyncHandlerMessage>,
    processor: ActorRef<SyncProcessorMessage>,
    handler_handle: JoinHandle<()>,
    processor_handle: JoinHandle<()>,
}

/// Spawn the processor around `engine`, then the handler in front of it.
///
/// Jobs already in the engine's queue are replayed before this returns.
pub async fn start_sync_system<R, S, Q>(engine: SyncEngine<R, S, Q>) -> Result<SyncSystem, ActorError>
where
    R: RegistryApi,
    S: DeviceStateStore,
    Q: JobQueue,
{
    let queue = Arc::clone(engine.queue());

    let (processor, processor_handle) = Actor::spawn(None, SyncProcessor::new(), engine)
        .await
        .map_err(|e| ActorError::Spawn(e.to_string()))?;

    let args = SyncHandlerArgs {
        queue,
        processor: processor.clone(),
    };
    let (handler, handler_handle) = match Actor::spawn(None, SyncHandler::<Q>::new(), args).await
    {
        Ok(spawned) => spawned,
        Err(e) => {
            processor.stop(None);
            return Err(ActorError::Spawn(e.to_string()));
        }
    };

    Ok(SyncSystem {
        handler,
        processor,
        handler_handle,
        processor_handle,
    })
}

impl SyncSystem {
    /// Durably enqueue a job. Returns once the job is recorded.
    pub async fn enqueue(&self, job: SyncJob) -> Result<(), ActorError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.handler.send_message(SyncHandlerMessage::Enqueue {
            job: Box::new(job),
            reply: tx.into(),
        })?;
        rx.await
            .map_err(|_| ActorError::Actor("Sync handler dropped the reply".into()))?
            .map_err(ActorError::Enqueue)
    }

    /// Jobs still waiting in the durable queue, head first.
    pub async fn pending_jobs(&self) -> Result<Vec<SyncJob>, ActorError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.handler
            .send_message(SyncHandlerMessage::PendingJobs { reply: tx.into() })?;
        rx.await
            .map_err(|_| ActorError::Actor("Sync handler dropped the reply".into()))?
            .map_err(ActorError::Actor)
    }

    /// Wait until every job enqueued so far has been processed.
    pub async fn flush(&self) -> Result<(), ActorError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.handler
            .send_message(SyncHandlerMessage::Flush { reply: tx.into() })?;
        rx.await
            .map_err(|_| ActorError::Actor("Sync processor dropped the reply".into()))
    }

    /// Stop the handler, then let the processor drain its mailbox and stop.
    pub async fn shutdown(self) {
        let _ = self.handler.send_message(SyncHandlerMessage::Shutdown);
        let _ = self.handler_handle.await;

        // Everything the handler forwarded is now ahead of this message.
        let _ = self.processor.send_message(SyncProcessorMessage::Shutdown);
        let _ = self.processor_handle.await;
    }
}

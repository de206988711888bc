//! Front actor that records jobs durably before they are processed.

use std::marker::PhantomData;

use ractor::{Actor, ActorProcessingErr, ActorRef};
use std::sync::Arc;
use sync_core::JobQueue;

use crate::messages::{SyncHandlerMessage, SyncProcessorMessage};

/// State for the handler actor.
pub struct SyncHandlerState<Q> {
    queue: Arc<Q>,
    processor: ActorRef<SyncProcessorMessage>,
}

/// Arguments for the handler actor.
pub struct SyncHandlerArgs<Q> {
    pub queue: Arc<Q>,
    pub processor: ActorRef<SyncProcessorMessage>,
}

/// Handler actor.
///
/// On start it replays every durable job into the processor so work left
/// over from a previous run is picked up before anything new.
pub struct SyncHandler<Q>(PhantomData<fn() -> Q>);

impl<Q> SyncHandler<Q> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<Q> Default for SyncHandler<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: JobQueue> Actor for SyncHandler<Q> {
    type Msg = SyncHandlerMessage;
    type State = SyncHandlerState<Q>;
    type Arguments = SyncHandlerArgs<Q>;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let outstanding = args
            .queue
            .jobs()
            .await
            .map_err(|e| ActorProcessingErr::from(format!("Failed to read job queue: {}", e)))?;

        tracing::info!("Starting sync handler, replaying {} queued jobs", outstanding.len());
        for job in outstanding {
            args.processor.send_message(SyncProcessorMessage::Process {
                job: Box::new(job),
            })?;
        }

        Ok(SyncHandlerState {
            queue: args.queue,
            processor: args.processor,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SyncHandlerMessage::Enqueue { job, reply } => {
                if let Err(e) = state.queue.push(&job).await {
                    tracing::error!("Failed to persist {}: {}", job, e);
                    let _ = reply.send(Err(format!("Failed to persist job: {}", e)));
                    return Ok(());
                }

                tracing::debug!("Queued {}", job);
                let forwarded = state
                    .processor
                    .send_message(SyncProcessorMessage::Process { job });
                if let Err(e) = forwarded {
                    // Still durable, the next start replays it.
                    tracing::error!("Failed to forward job to processor: {}", e);
                }
                let _ = reply.send(Ok(()));
            }

            SyncHandlerMessage::PendingJobs { reply } => {
                let _ = reply.send(state.queue.jobs().await.map_err(|e| e.to_string()));
            }

            SyncHandlerMessage::Flush { reply } => {
                if state
                    .processor
                    .send_message(SyncProcessorMessage::Flush { reply })
                    .is_err()
                {
                    tracing::warn!("Processor is gone, nothing left to flush");
                }
            }

            SyncHandlerMessage::Shutdown => {
                tracing::info!("Shutting down sync handler");
                myself.stop(None);
            }
        }

        Ok(())
    }
}

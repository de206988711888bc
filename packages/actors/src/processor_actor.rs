//! Worker actor that owns the sync engine.

use std::marker::PhantomData;

use ractor::{Actor, ActorProcessingErr, ActorRef};
use sync_core::{DeviceStateStore, JobQueue, RegistryApi};

use crate::engine::{JobOutcome, SyncEngine};
use crate::messages::SyncProcessorMessage;

/// Processor actor.
///
/// Its mailbox is the ordered channel of jobs: one message is handled at a
/// time, so jobs are processed strictly in arrival order.
pub struct SyncProcessor<R, S, Q>(PhantomData<fn() -> (R, S, Q)>);

impl<R, S, Q> SyncProcessor<R, S, Q> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R, S, Q> Default for SyncProcessor<R, S, Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, S, Q> Actor for SyncProcessor<R, S, Q>
where
    R: RegistryApi,
    S: DeviceStateStore,
    Q: JobQueue,
{
    type Msg = SyncProcessorMessage;
    type State = SyncEngine<R, S, Q>;
    type Arguments = SyncEngine<R, S, Q>;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting sync processor");
        Ok(args)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SyncProcessorMessage::Process { job } => {
                let kind = job.kind();
                match state.handle_job(*job).await {
                    Ok(JobOutcome::Completed) => {}
                    Ok(JobOutcome::Skipped { reason }) => {
                        tracing::debug!("Skipped {} job: {}", kind, reason);
                    }
                    Ok(JobOutcome::Deferred) => {}
                    Err(e) => {
                        tracing::error!("Failed to process {} job: {}", kind, e);
                    }
                }
            }

            SyncProcessorMessage::Flush { reply } => {
                let _ = reply.send(());
            }

            SyncProcessorMessage::Shutdown => {
                tracing::info!("Shutting down sync processor");
                myself.stop(None);
            }
        }

        Ok(())
    }
}

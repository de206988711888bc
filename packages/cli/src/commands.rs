//! Command execution, generic over the storage backend.

use std::time::Duration;

use anyhow::Context;
use api::PushNotifications;
use serde_json::json;
use sync_core::DeviceStateStore;

use crate::Command;

pub async fn run<S: DeviceStateStore>(
    instance: PushNotifications<S>,
    command: Command,
    timeout: Duration,
) -> anyhow::Result<()> {
    let result = execute(&instance, command, timeout).await;

    if tokio::time::timeout(timeout, instance.shutdown())
        .await
        .is_err()
    {
        tracing::warn!("Shutdown timed out, unfinished jobs stay queued for the next run");
    }
    result
}

async fn execute<S: DeviceStateStore>(
    instance: &PushNotifications<S>,
    command: Command,
    timeout: Duration,
) -> anyhow::Result<()> {
    match command {
        Command::Start { token, .. } => instance.start(&token).await?,
        Command::RefreshToken { token } => instance.refresh_token(&token).await?,
        Command::Subscribe { interests } => {
            for interest in &interests {
                instance
                    .subscribe(interest)
                    .await
                    .with_context(|| format!("Failed to subscribe to '{}'", interest))?;
            }
        }
        Command::Unsubscribe { interests } => {
            for interest in &interests {
                instance
                    .unsubscribe(interest)
                    .await
                    .with_context(|| format!("Failed to unsubscribe from '{}'", interest))?;
            }
        }
        Command::Set { interests } => instance.set_subscriptions(interests).await?,
        Command::Clear => instance.unsubscribe_all().await?,
        Command::Status { json } => return print_status(instance, json).await,
        Command::Sync => {}
    }

    match tokio::time::timeout(timeout, instance.flush()).await {
        Ok(flushed) => flushed?,
        Err(_) => tracing::warn!(
            "Registry did not answer within {:?}, jobs stay queued",
            timeout
        ),
    }
    print_status(instance, false).await
}

async fn print_status<S: DeviceStateStore>(
    instance: &PushNotifications<S>,
    as_json: bool,
) -> anyhow::Result<()> {
    let device_id = instance.device_id().await?;
    let interests = instance.get_subscriptions().await?;
    let pending = instance.pending_jobs().await?;

    if as_json {
        let status = json!({
            "deviceId": device_id,
            "interests": interests,
            "pendingJobs": pending,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Device:    {}", device_id.as_deref().unwrap_or("(not started)"));
    println!("Interests: {}", interests.len());
    for interest in &interests {
        println!("  - {}", interest);
    }
    println!("Pending:   {}", pending.len());
    for job in &pending {
        println!("  - {}", job);
    }
    Ok(())
}

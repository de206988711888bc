//! Construction of ready-to-use instances from a [`ClientConfig`].

use std::path::Path;

use actors::{FileDeviceStateStore, FileJobQueue};
use db::{DbConfig, SurrealDeviceStateStore, SurrealJobQueue};
use registry::HttpRegistryClient;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::instance::{InstanceOptions, PushNotifications};

/// Instance keeping its state in JSON files.
pub type FilePushNotifications = PushNotifications<FileDeviceStateStore>;

/// Instance keeping its state in SurrealDB.
pub type SurrealPushNotifications = PushNotifications<SurrealDeviceStateStore>;

const JOB_QUEUE_FILE: &str = "jobs.json";
const DEVICE_STATE_FILE: &str = "device.json";

fn options(config: &ClientConfig) -> InstanceOptions {
    InstanceOptions {
        known_previous_device_ids: config.known_previous_device_ids.clone(),
        retry: config.retry.clone(),
    }
}

/// Start an instance backed by files under `dir`.
pub async fn connect_files(
    config: &ClientConfig,
    dir: impl AsRef<Path>,
) -> Result<FilePushNotifications, ApiError> {
    let dir = dir.as_ref();
    tracing::info!("Initializing interest sync in {:?}", dir);

    let registry = HttpRegistryClient::new(config.registry_config())?;
    let queue = FileJobQueue::open(dir.join(JOB_QUEUE_FILE)).await?;
    let store = FileDeviceStateStore::new(dir.join(DEVICE_STATE_FILE));

    PushNotifications::new(registry, store, queue, options(config)).await
}

/// Start an instance backed by SurrealDB.
pub async fn connect_surreal(
    config: &ClientConfig,
    db_config: &DbConfig,
) -> Result<SurrealPushNotifications, ApiError> {
    tracing::info!("Initializing interest sync on {}", db_config.endpoint);

    let registry = HttpRegistryClient::new(config.registry_config())?;
    let database = db::init(db_config).await?;
    let queue = SurrealJobQueue::open(database.clone()).await?;
    let store = SurrealDeviceStateStore::open(database).await?;

    PushNotifications::new(registry, store, queue, options(config)).await
}

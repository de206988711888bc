//! Device state store backed by SurrealDB.

use serde::{Deserialize, Serialize};
use sync_core::{DeviceState, DeviceStateStore, StoreError};

use crate::schema::{DEVICE_STATE_TABLE, init_schema};
use crate::{Database, DbError};

/// Key of the single device state record.
const STATE_KEY: &str = "current";

/// Internal record type for SurrealDB.
#[derive(Debug, Serialize, Deserialize)]
struct DeviceStateRecord {
    device_id: Option<String>,
    push_token: Option<String>,
    #[serde(default)]
    interests: Vec<String>,
}

impl From<&DeviceState> for DeviceStateRecord {
    fn from(state: &DeviceState) -> Self {
        Self {
            device_id: state.device_id.clone(),
            push_token: state.push_token.clone(),
            interests: state.interests.iter().cloned().collect(),
        }
    }
}

impl From<DeviceStateRecord> for DeviceState {
    fn from(record: DeviceStateRecord) -> Self {
        Self {
            device_id: record.device_id,
            push_token: record.push_token,
            interests: record.interests.into_iter().collect(),
        }
    }
}

/// Device state kept as a single record in the `device_state` table.
pub struct SurrealDeviceStateStore {
    db: Database,
}

impl SurrealDeviceStateStore {
    /// Open the store on an existing connection.
    pub async fn open(db: Database) -> Result<Self, DbError> {
        init_schema(&db).await?;
        Ok(Self { db })
    }

    /// Remove the stored state.
    pub async fn clear(&self) -> Result<(), DbError> {
        let _: Option<DeviceStateRecord> = self.db.delete((DEVICE_STATE_TABLE, STATE_KEY)).await?;
        Ok(())
    }
}

impl DeviceStateStore for SurrealDeviceStateStore {
    async fn load(&self) -> Result<DeviceState, StoreError> {
        let record: Option<DeviceStateRecord> = self
            .db
            .select((DEVICE_STATE_TABLE, STATE_KEY))
            .await
            .map_err(DbError::from)?;

        Ok(record.map(DeviceState::from).unwrap_or_default())
    }

    async fn replace(&self, state: &DeviceState) -> Result<(), StoreError> {
        let _: Option<DeviceStateRecord> = self
            .db
            .upsert((DEVICE_STATE_TABLE, STATE_KEY))
            .content(DeviceStateRecord::from(state))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}

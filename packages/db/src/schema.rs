//! Database schema definitions using SurrealQL.

use crate::{Database, DbError};

/// Table holding queued sync jobs.
pub(crate) const JOB_TABLE: &str = "sync_job";

/// Table holding the single device state record.
pub(crate) const DEVICE_STATE_TABLE: &str = "device_state";

/// Initialize the database schema.
///
/// This creates all necessary tables, fields, and indexes.
pub async fn init_schema(db: &Database) -> Result<(), DbError> {
    tracing::info!("Initializing database schema...");

    db.query(SYNC_JOB_SCHEMA).await?.check()?;
    db.query(DEVICE_STATE_SCHEMA).await?.check()?;

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Sync job table schema.
const SYNC_JOB_SCHEMA: &str = r#"
-- Pending sync jobs, ordered by sequence number
DEFINE TABLE IF NOT EXISTS sync_job SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS seq ON sync_job TYPE int;
DEFINE FIELD IF NOT EXISTS kind ON sync_job TYPE string;
DEFINE FIELD IF NOT EXISTS payload ON sync_job TYPE string;

DEFINE INDEX IF NOT EXISTS sync_job_seq ON sync_job FIELDS seq UNIQUE;
"#;

/// Device state table schema.
const DEVICE_STATE_SCHEMA: &str = r#"
-- Device identity and interests (single record)
DEFINE TABLE IF NOT EXISTS device_state SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS device_id ON device_state TYPE option<string>;
DEFINE FIELD IF NOT EXISTS push_token ON device_state TYPE option<string>;
DEFINE FIELD IF NOT EXISTS interests ON device_state TYPE array<string> DEFAULT [];
"#;

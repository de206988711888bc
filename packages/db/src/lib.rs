//! SurrealDB persistence for the interest sync system.
//!
//! This crate provides a durable job queue and a device state store backed
//! by SurrealDB.
//!
//! # Features
//!
//! - `memory` (default): Use in-memory storage for testing
//! - `rocksdb`: Use RocksDB for persistent file-based storage

mod connection;
mod schema;
pub mod repositories;

pub use connection::{Database, DbConfig, DbError, connect};
pub use repositories::{SurrealDeviceStateStore, SurrealJobQueue};
pub use schema::init_schema;

/// Connect to the database and make sure the schema exists.
pub async fn init(config: &DbConfig) -> Result<Database, DbError> {
    let db = connect(config).await?;
    init_schema(&db).await?;
    Ok(db)
}

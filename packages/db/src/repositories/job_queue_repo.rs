//! Durable job queue backed by SurrealDB.

use serde::{Deserialize, Serialize};
use sync_core::{JobQueue, QueueError, SyncJob};
use tokio::sync::Mutex;

use crate::schema::{JOB_TABLE, init_schema};
use crate::{Database, DbError};

/// Internal record type for SurrealDB.
///
/// The job is stored as its JSON encoding so the on-disk format matches
/// the file-backed queue.
#[derive(Debug, Serialize, Deserialize)]
struct JobRecord {
    seq: i64,
    kind: String,
    payload: String,
}

impl JobRecord {
    fn encode(seq: i64, job: &SyncJob) -> Result<Self, DbError> {
        Ok(Self {
            seq,
            kind: job.kind().to_string(),
            payload: serde_json::to_string(job)?,
        })
    }

    fn decode(&self) -> Result<SyncJob, DbError> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}

#[derive(Debug, Deserialize)]
struct SeqRow {
    seq: i64,
}

fn record_key(seq: i64) -> String {
    format!("{:020}", seq)
}

/// FIFO job queue stored in the `sync_job` table.
///
/// Records are keyed by a monotonically increasing sequence number, so a
/// reopened queue continues exactly where the previous process stopped.
pub struct SurrealJobQueue {
    db: Database,
    /// Next sequence number; the lock also serializes queue operations.
    next_seq: Mutex<i64>,
}

impl SurrealJobQueue {
    /// Open the queue on an existing connection.
    pub async fn open(db: Database) -> Result<Self, DbError> {
        init_schema(&db).await?;

        let mut response = db
            .query("SELECT seq FROM sync_job ORDER BY seq DESC LIMIT 1")
            .await?;
        let last: Vec<SeqRow> = response.take(0)?;
        let next_seq = last.first().map_or(0, |row| row.seq + 1);

        tracing::debug!("Opened sync job queue, next sequence {}", next_seq);

        Ok(Self {
            db,
            next_seq: Mutex::new(next_seq),
        })
    }

    async fn head(&self) -> Result<Option<JobRecord>, DbError> {
        let mut response = self
            .db
            .query("SELECT seq, kind, payload FROM sync_job ORDER BY seq ASC LIMIT 1")
            .await?;
        let records: Vec<JobRecord> = response.take(0)?;
        Ok(records.into_iter().next())
    }

    async fn all(&self) -> Result<Vec<JobRecord>, DbError> {
        let mut response = self
            .db
            .query("SELECT seq, kind, payload FROM sync_job ORDER BY seq ASC")
            .await?;
        Ok(response.take(0)?)
    }
}

impl JobQueue for SurrealJobQueue {
    async fn push(&self, job: &SyncJob) -> Result<(), QueueError> {
        let mut next_seq = self.next_seq.lock().await;
        let seq = *next_seq;
        let record = JobRecord::encode(seq, job)?;

        let created: Option<JobRecord> = self
            .db
            .create((JOB_TABLE, record_key(seq)))
            .content(record)
            .await
            .map_err(DbError::from)?;

        if created.is_none() {
            return Err(DbError::Query(format!("Failed to create sync job {}", seq)).into());
        }

        *next_seq = seq + 1;
        tracing::debug!("Queued {} job at sequence {}", job.kind(), seq);
        Ok(())
    }

    async fn peek(&self) -> Result<Option<SyncJob>, QueueError> {
        let _guard = self.next_seq.lock().await;
        match self.head().await? {
            Some(record) => Ok(Some(record.decode()?)),
            None => Ok(None),
        }
    }

    async fn pop(&self) -> Result<SyncJob, QueueError> {
        let _guard = self.next_seq.lock().await;
        let record = self.head().await?.ok_or(QueueError::Empty)?;
        let job = record.decode()?;

        let _: Option<JobRecord> = self
            .db
            .delete((JOB_TABLE, record_key(record.seq)))
            .await
            .map_err(DbError::from)?;

        tracing::debug!("Popped {} job at sequence {}", record.kind, record.seq);
        Ok(job)
    }

    async fn jobs(&self) -> Result<Vec<SyncJob>, QueueError> {
        let _guard = self.next_seq.lock().await;
        let records = self.all().await?;
        records
            .iter()
            .map(|record| record.decode().map_err(QueueError::from))
            .collect()
    }
}

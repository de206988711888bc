//! Atomic JSON file persistence.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use sync_core::{QueueError, StoreError};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// A single JSON document on disk.
///
/// Writes go to a temp file which is synced and renamed over the target, so
/// a reader sees either the old or the new document, never a torn one.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Save a value, creating parent directories as needed.
    pub async fn save<T: Serialize>(&self, value: &T) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(value)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &self.path).await?;

        tracing::debug!("Saved {:?}", self.path);
        Ok(())
    }

    /// Load the value, or `None` if the file was never written.
    pub async fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, PersistenceError> {
        let json = match fs::read(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value = serde_json::from_slice(&json)?;
        tracing::debug!("Loaded {:?}", self.path);
        Ok(Some(value))
    }

    /// Remove the file if present.
    pub async fn delete(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!("Deleted {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<PersistenceError> for QueueError {
    fn from(e: PersistenceError) -> Self {
        match e {
            PersistenceError::Io(e) => QueueError::Storage(e.to_string()),
            PersistenceError::Json(e) => QueueError::Serialization(e.to_string()),
        }
    }
}

impl From<PersistenceError> for StoreError {
    fn from(e: PersistenceError) -> Self {
        match e {
            PersistenceError::Io(e) => StoreError::Storage(e.to_string()),
            PersistenceError::Json(e) => StoreError::Serialization(e.to_string()),
        }
    }
}

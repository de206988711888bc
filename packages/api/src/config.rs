//! Client configuration.

use std::path::PathBuf;

use db::DbConfig;
use registry::RegistryConfig;
use sync_core::RetryStrategy;

use crate::error::ApiError;

/// Default directory for file-backed state.
pub const DEFAULT_DATA_DIR: &str = "./data/interest-sync";

/// Where the job queue and device state live.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// JSON files in a directory.
    Files { dir: PathBuf },
    /// A SurrealDB database.
    Surreal(DbConfig),
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::Files {
            dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

/// Configuration for a [`crate::PushNotifications`] instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub instance_id: String,
    /// Overrides the hosted registry URL.
    pub base_url: Option<String>,
    pub storage: StorageBackend,
    /// Device IDs this installation was registered under before, so the
    /// registry can merge them.
    pub known_previous_device_ids: Vec<String>,
    pub retry: RetryStrategy,
}

impl ClientConfig {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            base_url: None,
            storage: StorageBackend::default(),
            known_previous_device_ids: Vec::new(),
            retry: RetryStrategy::infinite(),
        }
    }

    pub fn with_storage(mut self, storage: StorageBackend) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_known_previous_device_ids(mut self, ids: Vec<String>) -> Self {
        self.known_previous_device_ids = ids;
        self
    }

    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    /// Read configuration from `INTEREST_SYNC_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let instance_id = lookup("INTEREST_SYNC_INSTANCE_ID")
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::Config("INTEREST_SYNC_INSTANCE_ID is not set".into()))?;

        let dir = PathBuf::from(
            lookup("INTEREST_SYNC_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        );
        let storage = match lookup("INTEREST_SYNC_STORAGE").as_deref() {
            None | Some("files") => StorageBackend::Files { dir },
            Some("surreal") => {
                StorageBackend::Surreal(DbConfig::rocksdb(dir.join("db").to_string_lossy()))
            }
            Some(other) => {
                return Err(ApiError::Config(format!(
                    "Unknown storage backend '{}', expected 'files' or 'surreal'",
                    other
                )));
            }
        };

        let mut config = Self::new(instance_id).with_storage(storage);
        if let Some(base_url) = lookup("INTEREST_SYNC_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }

    /// Registry client configuration derived from this config.
    pub fn registry_config(&self) -> RegistryConfig {
        let config = RegistryConfig::new(&self.instance_id);
        match &self.base_url {
            Some(base_url) => config.with_base_url(base_url),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn instance_id_is_required() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn defaults_to_file_storage() {
        let config =
            ClientConfig::from_lookup(lookup(&[("INTEREST_SYNC_INSTANCE_ID", "abc")])).unwrap();

        assert_eq!(config.instance_id, "abc");
        assert!(matches!(
            config.storage,
            StorageBackend::Files { ref dir } if dir == &PathBuf::from(DEFAULT_DATA_DIR)
        ));
        assert_eq!(
            config.registry_config().base_url,
            "https://abc.pushnotifications.pusher.com/device_api/v1"
        );
    }

    #[test]
    fn reads_surreal_backend_and_base_url() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("INTEREST_SYNC_INSTANCE_ID", "abc"),
            ("INTEREST_SYNC_STORAGE", "surreal"),
            ("INTEREST_SYNC_DATA_DIR", "/tmp/sync"),
            ("INTEREST_SYNC_BASE_URL", "http://localhost:9000/"),
        ]))
        .unwrap();

        match config.storage {
            StorageBackend::Surreal(ref db) => assert_eq!(db.endpoint, "rocksdb:///tmp/sync/db"),
            other => panic!("unexpected storage: {:?}", other),
        }
        assert_eq!(config.registry_config().base_url, "http://localhost:9000");
    }

    #[test]
    fn rejects_unknown_backend() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("INTEREST_SYNC_INSTANCE_ID", "abc"),
            ("INTEREST_SYNC_STORAGE", "redis"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }
}

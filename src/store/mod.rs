pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage io error: {0}")]
    Io(String),

    #[error("Json conversion(Serde) error: {0}")]
    Serde(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

/// Key path, e.g. `["videos", "my-movie"]`
pub type Key = Vec<String>;

pub fn key(parts: &[&str]) -> Key {
    parts.iter().map(|p| p.to_string()).collect()
}

/// Durable string key-value store with atomic single-key operations.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    async fn get(&self, key: &[&str]) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite a value.
    async fn set(&self, key: &[&str], value: String) -> Result<(), StoreError>;

    /// Remove a key. Returns whether the key existed.
    async fn delete(&self, key: &[&str]) -> Result<bool, StoreError>;

    /// All entries whose key starts with `prefix`, in key order.
    async fn list(&self, prefix: &[&str]) -> Result<Vec<(Key, String)>, StoreError>;
}

fn has_prefix(key: &[String], prefix: &[&str]) -> bool {
    key.len() >= prefix.len() && key.iter().zip(prefix).all(|(k, p)| k == p)
}

#[derive(Clone, Debug)]
pub enum StorageBackend {
    Memory,
    File { path: PathBuf },
}

/// Build the configured store backend.
pub async fn open_store(backend: &StorageBackend) -> Result<Arc<dyn KvStore>, StoreError> {
    match backend {
        StorageBackend::Memory => {
            info!("Using in-memory link store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::File { path } => {
            info!(path = %path.display(), "Using file-backed link store");
            Ok(Arc::new(FileStore::open(path.clone()).await?))
        }
    }
}

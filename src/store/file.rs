use super::{Key, KvStore, StoreError, has_prefix, key};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex as TokioMutex;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: Key,
    value: String,
}

/// Store persisted as a JSON snapshot, rewritten on every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<Key, String>>,
    // Serializes mutation + snapshot so the file never lags behind a newer write.
    write_lock: TokioMutex<()>,
}

impl FileStore {
    /// Open the store at `path`, loading any existing snapshot.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => {
                let stored: Vec<StoredEntry> = serde_json::from_str(&content)
                    .inspect_err(|error| warn!(?error, path = %path.display(), "Failed to parse store file"))?;
                stored.into_iter().map(|e| (e.key, e.value)).collect()
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No store file, starting empty");
                BTreeMap::new()
            }
            Err(error) => return Err(error.into()),
        };

        info!(count = entries.len(), file = %path.display(), "Loaded link store");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
            write_lock: TokioMutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `entries` to disk. The live map is only replaced by callers
    /// after this succeeds.
    async fn save(&self, entries: &BTreeMap<Key, String>) -> Result<(), StoreError> {
        let snapshot = entries
            .iter()
            .map(|(k, v)| StoredEntry {
                key: k.clone(),
                value: v.clone(),
            })
            .collect::<Vec<_>>();
        let content = serde_json::to_string_pretty(&snapshot)?;
        debug!(path = %self.path.display(), count = snapshot.len(), "Saving store file");

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, k: &[&str]) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().get(&key(k)).cloned())
    }

    async fn set(&self, k: &[&str], value: String) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut next = self.entries.read().clone();
        next.insert(key(k), value);

        self.save(&next).await?;
        *self.entries.write() = next;
        Ok(())
    }

    async fn delete(&self, k: &[&str]) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut next = self.entries.read().clone();
        if next.remove(&key(k)).is_none() {
            return Ok(false);
        }

        self.save(&next).await?;
        *self.entries.write() = next;
        Ok(true)
    }

    async fn list(&self, prefix: &[&str]) -> Result<Vec<(Key, String)>, StoreError> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|(k, _)| has_prefix(k, prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

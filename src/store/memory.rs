use super::{Key, KvStore, StoreError, has_prefix, key};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Process-lifetime store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Key, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, k: &[&str]) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().get(&key(k)).cloned())
    }

    async fn set(&self, k: &[&str], value: String) -> Result<(), StoreError> {
        self.entries.write().insert(key(k), value);
        Ok(())
    }

    async fn delete(&self, k: &[&str]) -> Result<bool, StoreError> {
        Ok(self.entries.write().remove(&key(k)).is_some())
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

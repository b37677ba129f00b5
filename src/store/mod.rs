pub mod disk;
pub mod holdings;
pub mod memory;
pub mod notifications;
pub mod prices;

use crate::core::cache::{KeyValueCollection, Store};
use anyhow::{Context, Result, anyhow};
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions, PersistMode};
use memory::MemoryCollection;
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, RwLock},
};
use tracing::debug;

pub const PRICE_CACHE: &str = "price_cache";
pub const PRICE_HISTORY: &str = "price_history";
pub const HOLDINGS: &str = "holdings";
pub const NOTIFICATION_SETTINGS: &str = "notification_settings";

/// A thread-safe key-value store that can hold multiple collections.
///
/// Collections live in a fjall keyspace on disk, or in memory when the store
/// is created with [`KeyValueStore::in_memory`].
pub struct KeyValueStore {
    collections: RwLock<HashMap<String, Arc<dyn KeyValueCollection>>>,
    keyspace: Option<Arc<Keyspace>>,
}

impl KeyValueStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;
        let keyspace = fjall::Config::new(path.join("store"))
            .open()
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        debug!("Opened store at {}", path.display());

        Ok(Self {
            collections: RwLock::new(HashMap::new()),
            keyspace: Some(Arc::new(keyspace)),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace: None,
        }
    }

    /// Flushes pending writes to disk. A no-op for in-memory stores.
    pub fn persist(&self) -> Result<()> {
        if let Some(keyspace) = &self.keyspace {
            keyspace
                .persist(PersistMode::SyncAll)
                .context("Failed to persist store")?;
        }
        Ok(())
    }
}

impl Store for KeyValueStore {
    fn get_collection(&self, name: &str) -> Result<Arc<dyn KeyValueCollection>> {
        if let Some(existing) = self
            .collections
            .read()
            .map_err(|_| anyhow!("Store lock poisoned"))?
            .get(name)
        {
            return Ok(Arc::clone(existing));
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|_| anyhow!("Store lock poisoned"))?;
        if let Some(existing) = collections.get(name) {
            return Ok(Arc::clone(existing));
        }

        let collection: Arc<dyn KeyValueCollection> = match &self.keyspace {
            Some(keyspace) => {
                let partition = keyspace
                    .open_partition(name, PartitionCreateOptions::default())
                    .with_context(|| format!("Failed to open collection: {name}"))?;
                Arc::new(DiskCollection::new(partition))
            }
            None => Arc::new(MemoryCollection::new()),
        };
        collections.insert(name.to_string(), Arc::clone(&collection));
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_in_memory_collections_are_shared_by_name() {
        let store = KeyValueStore::in_memory();
        let first = store.get_collection(HOLDINGS).unwrap();
        first.put(b"k", b"v").await.unwrap();

        let second = store.get_collection(HOLDINGS).unwrap();
        assert_eq!(second.get(b"k").await.unwrap(), Some(b"v".to_vec()));

        let other = store.get_collection(PRICE_CACHE).unwrap();
        assert!(other.get(b"k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disk_store_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = KeyValueStore::open(dir.path()).unwrap();
            let prices = store.get_collection(PRICE_CACHE).unwrap();
            prices.put(b"gold", b"1").await.unwrap();
            store.persist().unwrap();
        }

        let store = KeyValueStore::open(dir.path()).unwrap();
        let prices = store.get_collection(PRICE_CACHE).unwrap();
        assert_eq!(prices.get(b"gold").await.unwrap(), Some(b"1".to_vec()));
    }
}

use crate::core::cache::KeyValueCollection;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory collection backed by an ordered map
#[derive(Clone, Default)]
pub struct MemoryCollection {
    inner: Arc<Mutex<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueCollection for MemoryCollection {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let map = self.inner.lock().await;
        let value = map.get(key).cloned();
        if value.is_some() {
            debug!("Store HIT for key: {}", String::from_utf8_lossy(key));
        } else {
            debug!("Store MISS for key: {}", String::from_utf8_lossy(key));
        }
        Ok(value)
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut map = self.inner.lock().await;
        debug!("Store PUT for key: {}", String::from_utf8_lossy(key));
        map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &[u8]) -> Result<bool> {
        let mut map = self.inner.lock().await;
        debug!("Store REMOVE for key: {}", String::from_utf8_lossy(key));
        Ok(map.remove(key).is_some())
    }

    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let map = self.inner.lock().await;
        Ok(map
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

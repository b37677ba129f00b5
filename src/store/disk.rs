use crate::core::cache::KeyValueCollection;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::PartitionHandle;
use tracing::debug;

/// A collection persisted as one fjall partition.
pub struct DiskCollection {
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(partition: PartitionHandle) -> Self {
        Self { partition }
    }
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self
            .partition
            .get(key)
            .with_context(|| format!("Failed to read key: {}", String::from_utf8_lossy(key)))?;
        match &value {
            Some(_) => debug!("Store HIT for key: {}", String::from_utf8_lossy(key)),
            None => debug!("Store MISS for key: {}", String::from_utf8_lossy(key)),
        }
        Ok(value.map(|v| v.to_vec()))
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.partition
            .insert(key, value)
            .with_context(|| format!("Failed to write key: {}", String::from_utf8_lossy(key)))?;
        debug!("Store PUT for key: {}", String::from_utf8_lossy(key));
        Ok(())
    }

    async fn remove(&self, key: &[u8]) -> Result<bool> {
        let existed = self.partition.contains_key(key)?;
        if existed {
            self.partition.remove(key).with_context(|| {
                format!("Failed to remove key: {}", String::from_utf8_lossy(key))
            })?;
            debug!("Store REMOVE for key: {}", String::from_utf8_lossy(key));
        }
        Ok(existed)
    }

    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.partition
            .prefix(prefix)
            .map(|item| {
                let (k, v) = item.context("Failed to scan partition")?;
                Ok((k.to_vec(), v.to_vec()))
            })
            .collect()
    }
}

//! Storage abstractions shared by the price cache, history and per-user records.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// An ordered byte-keyed collection. Keys are returned in ascending byte order.
#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Inserts or overwrites the value stored under `key`.
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Returns `true` if a value was present.
    async fn remove(&self, key: &[u8]) -> Result<bool>;

    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}

/// A set of named collections.
pub trait Store: Send + Sync {
    fn get_collection(&self, name: &str) -> Result<Arc<dyn KeyValueCollection>>;
}

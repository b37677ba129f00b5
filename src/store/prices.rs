//! Price cache and price history tables.

use super::{PRICE_CACHE, PRICE_HISTORY};
use crate::core::cache::{KeyValueCollection, Store};
use crate::core::price::{Metal, PriceCacheEntry, PriceHistoryPoint};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct PriceTables {
    cache: Arc<dyn KeyValueCollection>,
    history: Arc<dyn KeyValueCollection>,
}

fn history_key(metal: Metal, date: NaiveDate) -> String {
    format!("{}/{}", metal.as_str(), date.format("%Y-%m-%d"))
}

impl PriceTables {
    pub fn new(cache: Arc<dyn KeyValueCollection>, history: Arc<dyn KeyValueCollection>) -> Self {
        Self { cache, history }
    }

    pub fn open(store: &dyn Store) -> Result<Self> {
        Ok(Self::new(
            store.get_collection(PRICE_CACHE)?,
            store.get_collection(PRICE_HISTORY)?,
        ))
    }

    /// Reads every cached entry. Rows that don't decode to a known metal are skipped.
    pub async fn cached_entries(&self) -> Result<HashMap<Metal, PriceCacheEntry>> {
        let rows = self
            .cache
            .scan_prefix(b"")
            .await
            .context("Failed to read price cache")?;

        let mut entries = HashMap::new();
        for (key, value) in rows {
            match serde_json::from_slice::<PriceCacheEntry>(&value) {
                Ok(entry) => {
                    entries.insert(entry.metal, entry);
                }
                Err(e) => debug!(
                    "Skipping price cache row {}: {}",
                    String::from_utf8_lossy(&key),
                    e
                ),
            }
        }
        Ok(entries)
    }

    pub async fn upsert_cache(&self, entry: &PriceCacheEntry) -> Result<()> {
        self.cache
            .put(entry.metal.as_str().as_bytes(), &serde_json::to_vec(entry)?)
            .await
            .with_context(|| format!("Failed to update cached {} price", entry.metal))
    }

    /// Writes the point for its (metal, day), replacing any price recorded that day.
    pub async fn upsert_history(&self, point: &PriceHistoryPoint) -> Result<()> {
        let key = history_key(point.metal, point.date);
        self.history
            .put(key.as_bytes(), &serde_json::to_vec(point)?)
            .await
            .with_context(|| format!("Failed to record {} price history", point.metal))
    }

    /// Points for `metal` dated on or after `since`, oldest first.
    pub async fn history_since(
        &self,
        metal: Metal,
        since: NaiveDate,
    ) -> Result<Vec<PriceHistoryPoint>> {
        let prefix = format!("{}/", metal.as_str());
        let rows = self
            .history
            .scan_prefix(prefix.as_bytes())
            .await
            .with_context(|| format!("Failed to read {metal} price history"))?;

        let mut points = rows
            .into_iter()
            .map(|(_, value)| serde_json::from_slice::<PriceHistoryPoint>(&value))
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to decode price history")?;
        points.retain(|p| p.date >= since);
        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

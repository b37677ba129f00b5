//! Serves gold and silver spot prices from a cache that is refreshed from the
//! market-data provider once it is older than [`FRESHNESS_WINDOW_HOURS`].
//!
//! [`PriceCacheManager::get_detailed_prices`] never fails: a failed or skipped
//! refresh falls back to the stale cache, and metals missing from the cache
//! fall back to fixed placeholder prices.

use crate::core::price::{
    Metal, PriceCacheEntry, PriceHistoryPoint, PriceQuote, PriceSource, SpotPriceProvider,
    SpotPrices,
};
use crate::store::prices::PriceTables;
use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const FRESHNESS_WINDOW_HOURS: i64 = 6;

/// 3000.00, used only when gold has never been cached.
pub const PLACEHOLDER_GOLD_PRICE: Decimal = Decimal::from_parts(300_000, 0, 0, false, 2);
/// 40.25, used when nothing at all is cached.
pub const PLACEHOLDER_SILVER_PRICE: Decimal = Decimal::from_parts(4_025, 0, 0, false, 2);
/// 40.00, used when gold is cached but silver is not.
pub const PARTIAL_CACHE_SILVER_PRICE: Decimal = Decimal::from_parts(4_000, 0, 0, false, 2);

pub const DEFAULT_HISTORY_DAYS: u32 = 30;
pub const MAX_HISTORY_DAYS: u32 = 365;

/// The price used for a metal with no cached entry. `cache_empty` is true
/// when neither metal is cached.
pub fn placeholder_price(metal: Metal, cache_empty: bool) -> Decimal {
    match metal {
        Metal::Gold => PLACEHOLDER_GOLD_PRICE,
        Metal::Silver if cache_empty => PLACEHOLDER_SILVER_PRICE,
        Metal::Silver => PARTIAL_CACHE_SILVER_PRICE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Gold when unset.
    pub metal: Option<Metal>,
    pub days: u32,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            metal: None,
            days: DEFAULT_HISTORY_DAYS,
        }
    }
}

pub struct PriceCacheManager {
    tables: PriceTables,
    /// `None` when no market-data credential is configured.
    provider: Option<Arc<dyn SpotPriceProvider>>,
}

impl PriceCacheManager {
    pub fn new(tables: PriceTables, provider: Option<Arc<dyn SpotPriceProvider>>) -> Self {
        Self { tables, provider }
    }

    #[instrument(name = "DetailedPrices", skip(self))]
    pub async fn get_detailed_prices(&self) -> SpotPrices {
        let now = Utc::now();

        match self.tables.cached_entries().await {
            Ok(cached) => {
                if let Some(prices) = fresh_prices(&cached, now) {
                    debug!("Serving spot prices from fresh cache");
                    return prices;
                }
                debug!(
                    cached = cached.len(),
                    "Spot price cache is missing, partial or stale"
                );
            }
            Err(e) => {
                warn!(error = %e, "Failed to read spot price cache. Skipping refresh");
                return self.fallback(now).await;
            }
        }

        match self.refresh(now).await {
            Ok(prices) => prices,
            Err(e) => {
                warn!(error = %e, "Spot price refresh failed. Using cached data");
                self.fallback(now).await
            }
        }
    }

    /// Raw cache contents, without any refresh.
    pub async fn current_prices(&self) -> Vec<PriceCacheEntry> {
        match self.tables.cached_entries().await {
            Ok(cached) => {
                let mut entries: Vec<_> = cached.into_values().collect();
                entries.sort_by_key(|e| e.metal);
                entries
            }
            Err(e) => {
                warn!(error = %e, "Failed to read spot price cache");
                Vec::new()
            }
        }
    }

    pub async fn get_price_history(&self, query: HistoryQuery) -> Result<Vec<PriceHistoryPoint>> {
        if !(1..=MAX_HISTORY_DAYS).contains(&query.days) {
            bail!(
                "History lookback must be between 1 and {MAX_HISTORY_DAYS} days, got {}",
                query.days
            );
        }
        let metal = query.metal.unwrap_or(Metal::Gold);
        let since = (Utc::now() - Duration::days(i64::from(query.days))).date_naive();

        match self.tables.history_since(metal, since).await {
            Ok(points) => Ok(points),
            Err(e) => {
                warn!(error = %e, "Failed to read price history");
                Ok(Vec::new())
            }
        }
    }

    async fn refresh(&self, now: DateTime<Utc>) -> Result<SpotPrices> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| anyhow!("Market-data API key not configured"))?;

        let quotes = provider.fetch_spot_prices().await?;
        info!(gold = %quotes.gold, silver = %quotes.silver, "Fetched fresh spot prices");

        let today = now.date_naive();
        for (metal, price) in [(Metal::Gold, quotes.gold), (Metal::Silver, quotes.silver)] {
            let entry = PriceCacheEntry {
                metal,
                price,
                updated_at: now,
            };
            if let Err(e) = self.tables.upsert_cache(&entry).await {
                warn!(error = %e, %metal, "Failed to update price cache");
            }
            let point = PriceHistoryPoint {
                metal,
                price,
                date: today,
            };
            if let Err(e) = self.tables.upsert_history(&point).await {
                warn!(error = %e, %metal, "Failed to record price history");
            }
        }

        Ok(SpotPrices {
            gold: PriceQuote {
                metal: Metal::Gold,
                price: quotes.gold,
                observed_at: quotes.observed_at,
            },
            silver: PriceQuote {
                metal: Metal::Silver,
                price: quotes.silver,
                observed_at: quotes.observed_at,
            },
            source: PriceSource::Provider,
        })
    }

    async fn fallback(&self, now: DateTime<Utc>) -> SpotPrices {
        let cached = self.tables.cached_entries().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read spot price cache. Using placeholder prices");
            HashMap::new()
        });

        let cache_empty = Metal::ALL.iter().all(|metal| !cached.contains_key(metal));
        let quote = |metal: Metal| {
            cached.get(&metal).map_or_else(
                || {
                    debug!(%metal, "No cached price. Using placeholder");
                    PriceQuote {
                        metal,
                        price: placeholder_price(metal, cache_empty),
                        observed_at: now,
                    }
                },
                PriceCacheEntry::to_quote,
            )
        };

        SpotPrices {
            gold: quote(Metal::Gold),
            silver: quote(Metal::Silver),
            source: PriceSource::Fallback,
        }
    }
}

/// Both metals must be cached and updated strictly within the freshness window.
fn fresh_prices(cached: &HashMap<Metal, PriceCacheEntry>, now: DateTime<Utc>) -> Option<SpotPrices> {
    let cutoff = now - Duration::hours(FRESHNESS_WINDOW_HOURS);
    let fresh = |metal: Metal| {
        cached
            .get(&metal)
            .filter(|entry| entry.updated_at > cutoff)
            .map(PriceCacheEntry::to_quote)
    };

    Some(SpotPrices {
        gold: fresh(Metal::Gold)?,
        silver: fresh(Metal::Silver)?,
        source: PriceSource::Cache,
    })
}

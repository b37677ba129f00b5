//! Pricing abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metal {
    Gold,
    Silver,
}

impl Metal {
    pub const ALL: [Metal; 2] = [Metal::Gold, Metal::Silver];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metal::Gold => "gold",
            Metal::Silver => "silver",
        }
    }
}

impl Display for Metal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Metal::Gold => "Gold",
                Metal::Silver => "Silver",
            }
        )
    }
}

impl FromStr for Metal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gold" | "au" => Ok(Metal::Gold),
            "silver" | "ag" => Ok(Metal::Silver),
            _ => Err(anyhow::anyhow!("Invalid metal: {}", s)),
        }
    }
}

/// A spot price for one troy ounce of a metal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub metal: Metal,
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
}

/// The latest price per metal, overwritten in place on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCacheEntry {
    pub metal: Metal,
    pub price: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl PriceCacheEntry {
    pub fn to_quote(&self) -> PriceQuote {
        PriceQuote {
            metal: self.metal,
            price: self.price,
            observed_at: self.updated_at,
        }
    }
}

/// One persisted observation per metal per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryPoint {
    pub metal: Metal,
    pub price: Decimal,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// Served from a fresh cache without an outbound call.
    Cache,
    /// Freshly fetched from the market-data provider.
    Provider,
    /// Stale cache and/or placeholder values after a failed or skipped refresh.
    Fallback,
}

impl Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PriceSource::Cache => "cache",
                PriceSource::Provider => "live",
                PriceSource::Fallback => "fallback",
            }
        )
    }
}

/// Gold and silver quotes served together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotPrices {
    pub gold: PriceQuote,
    pub silver: PriceQuote,
    pub source: PriceSource,
}

impl SpotPrices {
    pub fn quote(&self, metal: Metal) -> &PriceQuote {
        match metal {
            Metal::Gold => &self.gold,
            Metal::Silver => &self.silver,
        }
    }
}

/// Gold and silver prices as reported by a market-data provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderQuotes {
    pub gold: Decimal,
    pub silver: Decimal,
    pub observed_at: DateTime<Utc>,
}

#[async_trait]
pub trait SpotPriceProvider: Send + Sync {
    async fn fetch_spot_prices(&self) -> Result<ProviderQuotes>;
}

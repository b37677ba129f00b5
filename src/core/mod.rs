//! Core business logic abstractions

pub mod analytics;
pub mod cache;
pub mod config;
pub mod holding;
pub mod identity;
pub mod log;
pub mod notification;
pub mod price;
pub mod pricing;

// Re-export main types for cleaner imports
pub use cache::{KeyValueCollection, Store};
pub use notification::NotificationSink;
pub use price::{Metal, PriceSource, SpotPriceProvider, SpotPrices};
pub use pricing::{HistoryQuery, PriceCacheManager};

//! Notification settings and the webhook messages built from them: an on-demand
//! test message and the daily portfolio digest.

use crate::core::analytics::{HoldingSummary, format_money, round2, summarize};
use crate::core::identity::UserId;
use crate::core::price::Metal;
use crate::store::holdings::HoldingsStore;
use crate::store::notifications::NotificationStore;
use crate::store::prices::PriceTables;
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const TEST_MESSAGE: &str = "**Bullion test**: if you see this, your webhook is working. \
You'll receive daily digests here when the daily summary is enabled.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub owner: String,
    pub daily_digest_enabled: bool,
    pub webhook_url: Option<String>,
    /// `None` until the settings are first saved.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl NotificationSettings {
    pub fn defaults(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            daily_digest_enabled: false,
            webhook_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// The webhook to post the digest to, if this user should get one.
    pub fn digest_webhook(&self) -> Option<&str> {
        if !self.daily_digest_enabled {
            return None;
        }
        self.webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Partial update; `None` keeps the stored value and an empty webhook clears it.
#[derive(Debug, Clone, Default)]
pub struct NotificationUpdate {
    pub daily_digest_enabled: Option<bool>,
    pub webhook_url: Option<String>,
}

impl NotificationUpdate {
    pub fn apply(
        self,
        current: &NotificationSettings,
        now: DateTime<Utc>,
    ) -> Result<NotificationSettings> {
        let webhook_url = match self.webhook_url {
            None => current.webhook_url.clone(),
            Some(url) if url.trim().is_empty() => None,
            Some(url) => Some(validate_webhook_url(url.trim())?),
        };

        Ok(NotificationSettings {
            owner: current.owner.clone(),
            daily_digest_enabled: self
                .daily_digest_enabled
                .unwrap_or(current.daily_digest_enabled),
            webhook_url,
            created_at: current.created_at.or(Some(now)),
            updated_at: Some(now),
        })
    }
}

fn validate_webhook_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw).with_context(|| format!("Invalid webhook URL: {raw}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Webhook URL must use http or https: {raw}");
    }
    // Stored as entered; `Url` would normalise it (e.g. add a trailing slash).
    Ok(raw.to_string())
}

/// Delivers a text message to a webhook.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn post(&self, url: &str, content: &str) -> Result<()>;
}

/// Renders the daily digest for one user.
pub fn format_digest(summary: &HoldingSummary, currency: &str, unit: &str) -> String {
    [
        "**Bullion Daily Digest**".to_string(),
        String::new(),
        format!("**Spot prices ({currency}/{unit})**"),
        format!("Gold: {}", format_money(summary.gold_price, currency)),
        format!("Silver: {}", format_money(summary.silver_price, currency)),
        String::new(),
        "**Your portfolio**".to_string(),
        format!("Total value: {}", format_money(summary.total_value, currency)),
        format!(
            "Gold: {:.2} oz | Silver: {:.2} oz",
            round2(summary.total_gold_oz),
            round2(summary.total_silver_oz)
        ),
    ]
    .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DigestReport {
    pub sent: usize,
    pub total: usize,
}

pub struct NotificationService {
    settings: NotificationStore,
    holdings: HoldingsStore,
    prices: PriceTables,
    sink: Arc<dyn NotificationSink>,
    currency: String,
    unit: String,
}

impl NotificationService {
    pub fn new(
        settings: NotificationStore,
        holdings: HoldingsStore,
        prices: PriceTables,
        sink: Arc<dyn NotificationSink>,
        currency: &str,
        unit: &str,
    ) -> Self {
        Self {
            settings,
            holdings,
            prices,
            sink,
            currency: currency.to_string(),
            unit: unit.to_string(),
        }
    }

    pub fn settings(&self) -> &NotificationStore {
        &self.settings
    }

    pub async fn send_test_message(&self, owner: &UserId) -> Result<()> {
        let settings = self.settings.get(owner).await?;
        let url = settings
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow!("No webhook URL saved. Add one first"))?;

        self.sink.post(url, TEST_MESSAGE).await?;
        info!(%owner, "Sent test message");
        Ok(())
    }

    /// Posts the digest to every enabled user, valued at the cached prices.
    /// `on_progress` is called once per recipient, whether or not delivery
    /// succeeded.
    #[instrument(name = "DailyDigest", skip(self, on_progress))]
    pub async fn run_daily_digest(&self, on_progress: &(dyn Fn() + Sync)) -> Result<DigestReport> {
        let recipients = self.settings.digest_recipients().await?;

        let cached = self.prices.cached_entries().await?;
        let price = |metal: Metal| cached.get(&metal).map_or(Decimal::ZERO, |e| e.price);
        let (gold_price, silver_price) = (price(Metal::Gold), price(Metal::Silver));
        debug!(%gold_price, %silver_price, "Digest prices from cache");

        let mut sent = 0;
        for settings in &recipients {
            match self.send_digest(settings, gold_price, silver_price).await {
                Ok(()) => sent += 1,
                Err(e) => warn!(owner = %settings.owner, error = %e, "Digest delivery failed"),
            }
            on_progress();
        }

        info!(sent, total = recipients.len(), "Daily digest finished");
        Ok(DigestReport {
            sent,
            total: recipients.len(),
        })
    }

    async fn send_digest(
        &self,
        settings: &NotificationSettings,
        gold_price: Decimal,
        silver_price: Decimal,
    ) -> Result<()> {
        let url = settings
            .digest_webhook()
            .ok_or_else(|| anyhow!("Digest not enabled for {}", settings.owner))?;
        let owner = UserId::parse(&settings.owner)?;
        let holdings = self.holdings.list(&owner).await?;
        let summary = summarize(&holdings, gold_price, silver_price);

        self.sink
            .post(url, &format_digest(&summary, &self.currency, &self.unit))
            .await
    }
}

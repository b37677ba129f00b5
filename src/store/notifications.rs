use super::NOTIFICATION_SETTINGS;
use crate::core::cache::{KeyValueCollection, Store};
use crate::core::identity::UserId;
use crate::core::notification::{NotificationSettings, NotificationUpdate};
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-user notification settings, keyed by user id.
#[derive(Clone)]
pub struct NotificationStore {
    collection: Arc<dyn KeyValueCollection>,
}

impl NotificationStore {
    pub fn new(collection: Arc<dyn KeyValueCollection>) -> Self {
        Self { collection }
    }

    pub fn open(store: &dyn Store) -> Result<Self> {
        Ok(Self::new(store.get_collection(NOTIFICATION_SETTINGS)?))
    }

    /// Stored settings, or disabled defaults for a user who never saved any.
    pub async fn get(&self, owner: &UserId) -> Result<NotificationSettings> {
        let stored = self
            .collection
            .get(owner.as_str().as_bytes())
            .await
            .with_context(|| format!("Failed to read notification settings for {owner}"))?;

        match stored {
            Some(value) => {
                serde_json::from_slice(&value).context("Failed to decode notification settings")
            }
            None => {
                debug!("No notification settings for {}. Using defaults", owner);
                Ok(NotificationSettings::defaults(owner.as_str()))
            }
        }
    }

    pub async fn update(
        &self,
        owner: &UserId,
        update: NotificationUpdate,
    ) -> Result<NotificationSettings> {
        let current = self.get(owner).await?;
        let settings = update.apply(&current, Utc::now())?;
        self.collection
            .put(owner.as_str().as_bytes(), &serde_json::to_vec(&settings)?)
            .await
            .with_context(|| format!("Failed to save notification settings for {owner}"))?;
        Ok(settings)
    }

    /// Users with the daily digest enabled and a webhook saved.
    pub async fn digest_recipients(&self) -> Result<Vec<NotificationSettings>> {
        let rows = self
            .collection
            .scan_prefix(b"")
            .await
            .context("Failed to read notification settings")?;

        Ok(rows
            .into_iter()
            .filter_map(
                |(key, value)| match serde_json::from_slice::<NotificationSettings>(&value) {
                    Ok(settings) => Some(settings),
                    Err(e) => {
                        warn!(
                            key = %String::from_utf8_lossy(&key),
                            error = %e,
                            "Skipping undecodable notification settings"
                        );
                        None
                    }
                },
            )
            .filter(|settings| settings.digest_webhook().is_some())
            .collect())
    }
}

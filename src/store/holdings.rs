//! Owner-scoped holding records. Keys are `{owner}/{id}`, so every read and
//! write is confined to the caller's own prefix.

use super::HOLDINGS;
use crate::core::cache::{KeyValueCollection, Store};
use crate::core::holding::{Holding, HoldingUpdate, NewHolding};
use crate::core::identity::UserId;
use crate::core::price::Metal;
use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct HoldingsStore {
    collection: Arc<dyn KeyValueCollection>,
}

fn holding_key(owner: &UserId, id: &Uuid) -> String {
    format!("{}/{}", owner.as_str(), id)
}

fn owner_prefix(owner: &UserId) -> String {
    format!("{}/", owner.as_str())
}

impl HoldingsStore {
    pub fn new(collection: Arc<dyn KeyValueCollection>) -> Self {
        Self { collection }
    }

    pub fn open(store: &dyn Store) -> Result<Self> {
        Ok(Self::new(store.get_collection(HOLDINGS)?))
    }

    /// All of the owner's holdings, newest first.
    pub async fn list(&self, owner: &UserId) -> Result<Vec<Holding>> {
        let rows = self
            .collection
            .scan_prefix(owner_prefix(owner).as_bytes())
            .await
            .with_context(|| format!("Failed to read holdings for {owner}"))?;

        let mut holdings = rows
            .into_iter()
            .map(|(_, value)| serde_json::from_slice::<Holding>(&value))
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to decode holdings")?;
        holdings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        debug!("Loaded {} holdings for {}", holdings.len(), owner);
        Ok(holdings)
    }

    pub async fn list_by_metal(&self, owner: &UserId, metal: Metal) -> Result<Vec<Holding>> {
        let mut holdings = self.list(owner).await?;
        holdings.retain(|h| h.metal == metal);
        Ok(holdings)
    }

    pub async fn get(&self, owner: &UserId, id: &Uuid) -> Result<Option<Holding>> {
        self.collection
            .get(holding_key(owner, id).as_bytes())
            .await?
            .map(|value| serde_json::from_slice(&value).context("Failed to decode holding"))
            .transpose()
    }

    pub async fn create(&self, owner: &UserId, new: NewHolding) -> Result<Holding> {
        let holding = new.into_holding(owner.as_str(), Utc::now())?;
        self.save(owner, &holding).await?;
        info!(id = %holding.id, metal = %holding.metal, "Created holding");
        Ok(holding)
    }

    pub async fn update(&self, owner: &UserId, id: &Uuid, update: HoldingUpdate) -> Result<Holding> {
        let existing = self
            .get(owner, id)
            .await?
            .ok_or_else(|| anyhow!("Holding {id} not found"))?;
        let holding = update.apply(&existing, Utc::now())?;
        self.save(owner, &holding).await?;
        info!(id = %holding.id, "Updated holding");
        Ok(holding)
    }

    /// Returns `false` when the owner has no holding with this id.
    pub async fn delete(&self, owner: &UserId, id: &Uuid) -> Result<bool> {
        let removed = self
            .collection
            .remove(holding_key(owner, id).as_bytes())
            .await
            .with_context(|| format!("Failed to delete holding {id}"))?;
        if removed {
            info!(%id, "Deleted holding");
        }
        Ok(removed)
    }

    async fn save(&self, owner: &UserId, holding: &Holding) -> Result<()> {
        self.collection
            .put(
                holding_key(owner, &holding.id).as_bytes(),
                &serde_json::to_vec(holding)?,
            )
            .await
            .with_context(|| format!("Failed to save holding {}", holding.id))
    }
}

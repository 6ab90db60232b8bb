//! Nested line-item storage, keyed by owning aggregate.
//!
//! Line items are owned by an external module; this port only exists so the
//! lifecycle service can cascade deletes and clone items during offer
//! conversion. The clone path is sequential and best-effort by design — a
//! partial clone is repaired via `revert_from_offer`, not a transaction.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sale_store::StoreError;

/// Owning aggregate of a line-item collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemOwner {
    pub aggregate_id: Uuid,
    pub aggregate_type: String,
}

impl ItemOwner {
    pub fn new(aggregate_id: impl Into<Uuid>, aggregate_type: impl Into<String>) -> Self {
        Self {
            aggregate_id: aggregate_id.into(),
            aggregate_type: aggregate_type.into(),
        }
    }

    pub fn sale(id: dealdesk_core::SaleId) -> Self {
        Self::new(id, "sale")
    }

    pub fn offer(id: dealdesk_core::OfferId) -> Self {
        Self::new(id, "offer")
    }
}

/// One nested line item (opaque to this core beyond identity and amount).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineItem {
    pub id: Uuid,
    pub description: String,
    pub quantity: i64,
    pub amount: f64,
}

#[async_trait]
pub trait PipelineItemsStore: Send + Sync {
    async fn get_all_items(&self, owner: &ItemOwner) -> Result<Vec<PipelineItem>, StoreError>;

    /// Replace the owner's items wholesale.
    async fn sync_items(&self, owner: &ItemOwner, items: Vec<PipelineItem>) -> Result<(), StoreError>;

    /// Copy every item of `from` onto `to` (fresh item ids). Returns the
    /// number of items cloned.
    async fn clone_all_items(&self, from: &ItemOwner, to: &ItemOwner) -> Result<usize, StoreError>;

    /// Delete the owner's items. Returns the number removed.
    async fn delete_all_items(&self, owner: &ItemOwner) -> Result<usize, StoreError>;
}

/// In-memory pipeline-items store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryPipelineItemsStore {
    inner: RwLock<HashMap<ItemOwner, Vec<PipelineItem>>>,
}

impl InMemoryPipelineItemsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_err() -> StoreError {
        StoreError::Backend("pipeline items lock poisoned".to_string())
    }
}

#[async_trait]
impl PipelineItemsStore for InMemoryPipelineItemsStore {
    async fn get_all_items(&self, owner: &ItemOwner) -> Result<Vec<PipelineItem>, StoreError> {
        let map = self.inner.read().map_err(|_| Self::lock_err())?;
        Ok(map.get(owner).cloned().unwrap_or_default())
    }

    async fn sync_items(&self, owner: &ItemOwner, items: Vec<PipelineItem>) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| Self::lock_err())?;
        map.insert(owner.clone(), items);
        Ok(())
    }

    async fn clone_all_items(&self, from: &ItemOwner, to: &ItemOwner) -> Result<usize, StoreError> {
        let mut map = self.inner.write().map_err(|_| Self::lock_err())?;
        let cloned: Vec<PipelineItem> = map
            .get(from)
            .map(|items| {
                items
                    .iter()
                    .map(|item| PipelineItem {
                        id: Uuid::now_v7(),
                        ..item.clone()
                    })
                    .collect()
            })
            .unwrap_or_default();
        let count = cloned.len();
        map.insert(to.clone(), cloned);
        Ok(count)
    }

    async fn delete_all_items(&self, owner: &ItemOwner) -> Result<usize, StoreError> {
        let mut map = self.inner.write().map_err(|_| Self::lock_err())?;
        Ok(map.remove(owner).map(|items| items.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealdesk_core::{OfferId, SaleId};

    fn item(description: &str, amount: f64) -> PipelineItem {
        PipelineItem {
            id: Uuid::now_v7(),
            description: description.to_string(),
            quantity: 1,
            amount,
        }
    }

    #[tokio::test]
    async fn clone_copies_items_with_fresh_ids() {
        let store = InMemoryPipelineItemsStore::new();
        let from = ItemOwner::offer(OfferId::new());
        let to = ItemOwner::sale(SaleId::new());

        store
            .sync_items(&from, vec![item("license", 100.0), item("setup", 50.0)])
            .await
            .unwrap();

        let count = store.clone_all_items(&from, &to).await.unwrap();
        assert_eq!(count, 2);

        let originals = store.get_all_items(&from).await.unwrap();
        let clones = store.get_all_items(&to).await.unwrap();
        assert_eq!(clones.len(), 2);
        assert!(clones.iter().all(|c| originals.iter().all(|o| o.id != c.id)));
        assert_eq!(clones[0].description, "license");
    }

    #[tokio::test]
    async fn delete_all_reports_removed_count() {
        let store = InMemoryPipelineItemsStore::new();
        let owner = ItemOwner::sale(SaleId::new());
        store.sync_items(&owner, vec![item("a", 1.0)]).await.unwrap();

        assert_eq!(store.delete_all_items(&owner).await.unwrap(), 1);
        assert_eq!(store.delete_all_items(&owner).await.unwrap(), 0);
    }
}

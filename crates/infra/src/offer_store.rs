//! Offer persistence port (convert/revert collaborator).

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use dealdesk_core::{Entity, OfferId};
use dealdesk_sales::Offer;

use crate::sale_store::StoreError;

#[async_trait]
pub trait OfferStore: Send + Sync {
    async fn insert(&self, offer: Offer) -> Result<(), StoreError>;

    async fn get(&self, id: OfferId) -> Result<Option<Offer>, StoreError>;

    /// Flip the converted flag; `NotFound` when the offer does not exist.
    async fn set_converted(&self, id: OfferId, converted: bool) -> Result<(), StoreError>;
}

/// In-memory offer store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOfferStore {
    inner: RwLock<HashMap<OfferId, Offer>>,
}

impl InMemoryOfferStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OfferStore for InMemoryOfferStore {
    async fn insert(&self, offer: Offer) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("offer store lock poisoned".to_string()))?;
        map.insert(offer.id(), offer);
        Ok(())
    }

    async fn get(&self, id: OfferId) -> Result<Option<Offer>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("offer store lock poisoned".to_string()))?;
        Ok(map.get(&id).cloned())
    }

    async fn set_converted(&self, id: OfferId, converted: bool) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("offer store lock poisoned".to_string()))?;
        let offer = map.get_mut(&id).ok_or(StoreError::NotFound)?;
        offer.converted = converted;
        Ok(())
    }
}

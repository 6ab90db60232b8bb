//! Sale lifecycle orchestration.
//!
//! Owns sale-number issuance (counter + bounded retry against duplicate
//! conflicts), the stage-history-preserving update path, totals refresh,
//! cascading removal, and the offer↔sale conversion pair. All writes take
//! an explicit actor; there is no ambient request context.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use dealdesk_auth::AuthenticatedUser;
use dealdesk_core::{DomainError, DomainResult, OfferId, SaleId};
use dealdesk_infra::{
    ItemOwner, OfferStore, PipelineItemsStore, SaleStore, SequenceCounter, StoreError,
    TotalsCalculator,
};
use dealdesk_sales::{Sale, SaleStatus};

/// Counter name backing the human-facing sale number.
pub const SALE_NUMBER_COUNTER: &str = "sale_no";

/// Bounded retry against duplicate-number conflicts. The counter can drift
/// behind the store (historical direct writes); each conflict resyncs it to
/// the store's actual maximum before the next attempt.
const NUMBER_ALLOCATION_ATTEMPTS: u32 = 3;

/// Input for `create`.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub customer_id: String,
    pub status: SaleStatus,
}

impl NewSale {
    pub fn for_customer(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            status: SaleStatus::Pending,
        }
    }
}

/// Partial update for `update`. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SaleUpdate {
    pub customer_id: Option<String>,
    pub status: Option<SaleStatus>,
}

pub struct SaleLifecycleService {
    sales: Arc<dyn SaleStore>,
    offers: Arc<dyn OfferStore>,
    counter: Arc<dyn SequenceCounter>,
    items: Arc<dyn PipelineItemsStore>,
    calculator: Arc<dyn TotalsCalculator>,
}

impl SaleLifecycleService {
    pub fn new(
        sales: Arc<dyn SaleStore>,
        offers: Arc<dyn OfferStore>,
        counter: Arc<dyn SequenceCounter>,
        items: Arc<dyn PipelineItemsStore>,
        calculator: Arc<dyn TotalsCalculator>,
    ) -> Self {
        Self {
            sales,
            offers,
            counter,
            items,
            calculator,
        }
    }

    /// Create a sale, allocating its unique sequential number.
    pub async fn create(&self, new: NewSale, actor: &AuthenticatedUser) -> DomainResult<Sale> {
        let sale_id = SaleId::new();
        let now = Utc::now();

        for attempt in 1..=NUMBER_ALLOCATION_ATTEMPTS {
            let no = self
                .counter
                .next(SALE_NUMBER_COUNTER)
                .await
                .map_err(|e| DomainError::conflict(e.to_string()))?;

            let sale = Sale::new(sale_id, no, new.customer_id.clone(), new.status, actor.id, now);

            match self.sales.insert(sale.clone()).await {
                Ok(()) => {
                    info!(sale_id = %sale_id, no, "sale created");
                    return Ok(sale);
                }
                Err(StoreError::DuplicateNo(no)) => {
                    // Counter is behind the store; repair and try again.
                    let observed_max = self.sales.max_no().await?;
                    warn!(no, observed_max, attempt, "sale number collision, resyncing counter");
                    self.counter
                        .resync(SALE_NUMBER_COUNTER, observed_max)
                        .await
                        .map_err(|e| DomainError::conflict(e.to_string()))?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::business_rule(
            "sale number generation retries exhausted",
        ))
    }

    /// Apply a partial update. A status change appends exactly one
    /// stage-history entry built from the pre-update snapshot; the append
    /// and the field update land in one store write.
    pub async fn update(
        &self,
        sale_id: SaleId,
        update: SaleUpdate,
        actor: &AuthenticatedUser,
    ) -> DomainResult<Sale> {
        let mut sale = self
            .sales
            .get(sale_id)
            .await?
            .ok_or(DomainError::NotFound)?;

        let now = Utc::now();
        if let Some(customer_id) = update.customer_id {
            sale.customer_id = customer_id;
            sale.updated_at = now;
        }
        if let Some(status) = update.status {
            sale.change_status(status, actor.id, now);
        }

        self.sales.put(sale.clone()).await?;
        Ok(sale)
    }

    /// Refresh totals from the external calculator.
    pub async fn calculate(&self, sale_id: SaleId) -> DomainResult<Sale> {
        let mut sale = self
            .sales
            .get(sale_id)
            .await?
            .ok_or(DomainError::NotFound)?;

        let totals = self
            .calculator
            .calculate_totals(&ItemOwner::sale(sale_id))
            .await
            .map_err(|e| DomainError::conflict(e.to_string()))?;

        sale.set_totals(totals, Utc::now());
        self.sales.put(sale.clone()).await?;
        Ok(sale)
    }

    /// Delete the sale and cascade deletion of its pipeline items. The sale
    /// delete is authoritative; item cleanup is best-effort and logged.
    pub async fn remove(&self, sale_id: SaleId) -> DomainResult<()> {
        if !self.sales.delete(sale_id).await? {
            return Err(DomainError::NotFound);
        }

        match self.items.delete_all_items(&ItemOwner::sale(sale_id)).await {
            Ok(count) => info!(sale_id = %sale_id, count, "sale removed with pipeline items"),
            Err(e) => warn!(sale_id = %sale_id, error = %e, "pipeline item cleanup failed"),
        }
        Ok(())
    }

    pub async fn find_one(&self, sale_id: SaleId) -> DomainResult<Sale> {
        self.sales
            .get(sale_id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn list(&self) -> DomainResult<Vec<Sale>> {
        Ok(self.sales.list().await?)
    }

    /// Convert an offer into a sale.
    ///
    /// The steps run sequentially with no multi-document transaction:
    /// create the sale (counter path), clone the offer's items, recalculate
    /// totals, mark the offer converted. A failure partway through leaves a
    /// repairable window; `revert_from_offer` is the compensating action.
    pub async fn convert_from_offer(
        &self,
        offer_id: OfferId,
        actor: &AuthenticatedUser,
    ) -> DomainResult<Sale> {
        let offer = self
            .offers
            .get(offer_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if offer.converted {
            return Err(DomainError::business_rule(format!(
                "offer {offer_id} is already converted"
            )));
        }

        let mut sale = self
            .create(NewSale::for_customer(offer.customer_id.clone()), actor)
            .await?;
        sale.source_offer_id = Some(offer_id);
        self.sales.put(sale.clone()).await?;

        // Item cloning is sequential and best-effort; revert repairs a
        // partial copy.
        match self
            .items
            .clone_all_items(&ItemOwner::offer(offer_id), &ItemOwner::sale(sale.id))
            .await
        {
            Ok(count) => info!(offer_id = %offer_id, sale_id = %sale.id, count, "offer items cloned"),
            Err(e) => warn!(offer_id = %offer_id, sale_id = %sale.id, error = %e, "offer item clone failed"),
        }

        let sale = self.calculate(sale.id).await?;
        self.offers.set_converted(offer_id, true).await?;

        info!(offer_id = %offer_id, sale_id = %sale.id, no = sale.no, "offer converted to sale");
        Ok(sale)
    }

    /// Compensating action for `convert_from_offer`: delete the cloned
    /// items, delete the sale, clear the offer's converted flag.
    pub async fn revert_from_offer(
        &self,
        sale_id: SaleId,
        _actor: &AuthenticatedUser,
    ) -> DomainResult<()> {
        let sale = self
            .sales
            .get(sale_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        let offer_id = sale.source_offer_id.ok_or_else(|| {
            DomainError::business_rule(format!("sale {} was not created from an offer", sale.no))
        })?;

        if let Err(e) = self.items.delete_all_items(&ItemOwner::sale(sale_id)).await {
            warn!(sale_id = %sale_id, error = %e, "pipeline item cleanup failed during revert");
        }
        self.sales.delete(sale_id).await?;
        self.offers.set_converted(offer_id, false).await?;

        info!(sale_id = %sale_id, offer_id = %offer_id, "offer conversion reverted");
        Ok(())
    }
}

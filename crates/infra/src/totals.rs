//! Totals calculation port.
//!
//! The lifecycle service never computes totals itself; it calls this
//! collaborator and stores whatever comes back as opaque numbers.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use dealdesk_sales::Totals;

use crate::pipeline_items::{ItemOwner, PipelineItemsStore};

#[derive(Debug, Error)]
pub enum CalculatorError {
    #[error("totals calculation failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait TotalsCalculator: Send + Sync {
    async fn calculate_totals(&self, owner: &ItemOwner) -> Result<Totals, CalculatorError>;
}

/// Calculator stand-in that sums the owner's pipeline items.
///
/// Good enough for tests/dev wiring; the production calculator lives in an
/// external service behind the same trait.
pub struct PipelineTotalsCalculator {
    items: Arc<dyn PipelineItemsStore>,
}

impl PipelineTotalsCalculator {
    pub fn new(items: Arc<dyn PipelineItemsStore>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl TotalsCalculator for PipelineTotalsCalculator {
    async fn calculate_totals(&self, owner: &ItemOwner) -> Result<Totals, CalculatorError> {
        let items = self
            .items
            .get_all_items(owner)
            .await
            .map_err(|e| CalculatorError::Failed(e.to_string()))?;

        let grand_total: f64 = items.iter().map(|i| i.amount * i.quantity as f64).sum();

        let mut totals = Totals::default();
        totals.0.insert("grand_total".to_string(), grand_total);
        totals.0.insert("item_count".to_string(), items.len() as f64);
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline_items::{InMemoryPipelineItemsStore, PipelineItem};
    use dealdesk_core::SaleId;
    use uuid::Uuid;

    #[tokio::test]
    async fn sums_item_amounts_into_grand_total() {
        let items = Arc::new(InMemoryPipelineItemsStore::new());
        let owner = ItemOwner::sale(SaleId::new());
        items
            .sync_items(
                &owner,
                vec![
                    PipelineItem { id: Uuid::now_v7(), description: "license".into(), quantity: 2, amount: 100.0 },
                    PipelineItem { id: Uuid::now_v7(), description: "setup".into(), quantity: 1, amount: 50.0 },
                ],
            )
            .await
            .unwrap();

        let calculator = PipelineTotalsCalculator::new(items);
        let totals = calculator.calculate_totals(&owner).await.unwrap();
        assert_eq!(totals.grand_total(), Some(250.0));
        assert_eq!(totals.0.get("item_count"), Some(&2.0));
    }
}

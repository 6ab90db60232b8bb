//! Lifecycle integration tests: number allocation, stage history, totals,
//! removal, offer conversion.

mod support;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use dealdesk_core::{DomainError, SaleId, UserId};
use dealdesk_infra::{
    CounterError, ItemOwner, OfferStore, PipelineItem, PipelineItemsStore, SaleStore,
    SequenceCounter,
};
use dealdesk_sales::{Offer, Sale, SaleStatus};
use dealdesk_workflow::{NewSale, SaleUpdate};

use support::{build_world, plain_user};

#[tokio::test]
async fn concurrent_creates_assign_distinct_gapless_numbers() {
    let world = build_world();
    let actor = plain_user("creator");

    let mut handles = Vec::new();
    for i in 0..16 {
        let lifecycle = world.lifecycle.clone();
        let actor = actor.clone();
        handles.push(tokio::spawn(async move {
            lifecycle
                .create(NewSale::for_customer(format!("C{i}")), &actor)
                .await
                .unwrap()
        }));
    }

    let mut numbers = HashSet::new();
    for handle in handles {
        let sale = handle.await.unwrap();
        assert!(numbers.insert(sale.no), "duplicate sale number {}", sale.no);
    }

    let expected: HashSet<u64> = (1..=16).collect();
    assert_eq!(numbers, expected);
}

#[tokio::test]
async fn two_simultaneous_creates_for_different_customers_both_succeed() {
    let world = build_world();
    let actor = plain_user("creator");

    let (a, b) = tokio::join!(
        world.lifecycle.create(NewSale::for_customer("C1"), &actor),
        world.lifecycle.create(NewSale::for_customer("C2"), &actor),
    );
    let (s1, s2) = (a.unwrap(), b.unwrap());
    assert_ne!(s1.no, s2.no);
    assert_eq!(s1.customer_id, "C1");
    assert_eq!(s2.customer_id, "C2");
}

#[tokio::test]
async fn counter_drift_is_repaired_by_resync_and_retry() {
    let world = build_world();
    let actor = plain_user("creator");

    let first = world
        .lifecycle
        .create(NewSale::for_customer("C1"), &actor)
        .await
        .unwrap();
    assert_eq!(first.no, 1);

    // Historical direct write: a sale number the counter never issued.
    let direct = Sale::new(SaleId::new(), 2, "C-direct", SaleStatus::Pending, UserId::new(), Utc::now());
    world.sales.insert(direct).await.unwrap();

    // next() would issue 2 again; the duplicate conflict must resync to the
    // store max and retry.
    let repaired = world
        .lifecycle
        .create(NewSale::for_customer("C3"), &actor)
        .await
        .unwrap();
    assert_eq!(repaired.no, 3);
}

/// Counter double that keeps issuing an already-taken number, to drive the
/// retry loop to exhaustion.
struct StuckCounter;

#[async_trait]
impl SequenceCounter for StuckCounter {
    async fn next(&self, _name: &str) -> Result<u64, CounterError> {
        Ok(7)
    }

    async fn resync(&self, _name: &str, _observed_max: u64) -> Result<(), CounterError> {
        Ok(())
    }
}

#[tokio::test]
async fn exhausted_number_retries_surface_a_business_error() {
    let world = build_world();
    let actor = plain_user("creator");

    let taken = Sale::new(SaleId::new(), 7, "C7", SaleStatus::Pending, UserId::new(), Utc::now());
    world.sales.insert(taken).await.unwrap();

    let calculator = Arc::new(dealdesk_infra::PipelineTotalsCalculator::new(world.items.clone()));
    let lifecycle = dealdesk_workflow::SaleLifecycleService::new(
        world.sales.clone(),
        world.offers.clone(),
        Arc::new(StuckCounter),
        world.items.clone(),
        calculator,
    );

    let err = lifecycle
        .create(NewSale::for_customer("C8"), &actor)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::BusinessRule(_)));
}

#[tokio::test]
async fn status_updates_build_a_chained_stage_history() {
    let world = build_world();
    let actor = plain_user("ops");

    let sale = world
        .lifecycle
        .create(NewSale::for_customer("C1"), &actor)
        .await
        .unwrap();

    for status in [
        SaleStatus::CollectionWaiting,
        SaleStatus::SetupWaiting,
        SaleStatus::Active,
    ] {
        world
            .lifecycle
            .update(sale.id, SaleUpdate { status: Some(status), ..Default::default() }, &actor)
            .await
            .unwrap();
    }

    // Same-status update must not append.
    let after = world
        .lifecycle
        .update(
            sale.id,
            SaleUpdate { status: Some(SaleStatus::Active), ..Default::default() },
            &actor,
        )
        .await
        .unwrap();

    assert_eq!(after.status, SaleStatus::Active);
    assert_eq!(after.stage_history.len(), 3);
    assert_eq!(after.stage_history[0].from_status, SaleStatus::Pending);
    for pair in after.stage_history.windows(2) {
        assert_eq!(pair[1].from_status, pair[0].to_status);
    }
}

#[tokio::test]
async fn calculate_refreshes_totals_from_the_calculator() {
    let world = build_world();
    let actor = plain_user("ops");

    let sale = world
        .lifecycle
        .create(NewSale::for_customer("C1"), &actor)
        .await
        .unwrap();
    world
        .items
        .sync_items(
            &ItemOwner::sale(sale.id),
            vec![PipelineItem {
                id: uuid::Uuid::now_v7(),
                description: "license".to_string(),
                quantity: 3,
                amount: 10.0,
            }],
        )
        .await
        .unwrap();

    let sale = world.lifecycle.calculate(sale.id).await.unwrap();
    assert_eq!(sale.totals.grand_total(), Some(30.0));
}

#[tokio::test]
async fn remove_deletes_the_sale_and_its_items() {
    let world = build_world();
    let actor = plain_user("ops");

    let sale = world
        .lifecycle
        .create(NewSale::for_customer("C1"), &actor)
        .await
        .unwrap();
    let owner = ItemOwner::sale(sale.id);
    world
        .items
        .sync_items(
            &owner,
            vec![PipelineItem {
                id: uuid::Uuid::now_v7(),
                description: "x".to_string(),
                quantity: 1,
                amount: 1.0,
            }],
        )
        .await
        .unwrap();

    world.lifecycle.remove(sale.id).await.unwrap();

    assert_eq!(world.lifecycle.find_one(sale.id).await.unwrap_err(), DomainError::NotFound);
    assert!(world.items.get_all_items(&owner).await.unwrap().is_empty());
    assert_eq!(world.lifecycle.remove(sale.id).await.unwrap_err(), DomainError::NotFound);
}

#[tokio::test]
async fn offer_conversion_clones_items_and_marks_the_offer() {
    let world = build_world();
    let actor = plain_user("sales-rep");

    let offer = Offer::new(dealdesk_core::OfferId::new(), "C9", actor.id, Utc::now());
    let offer_id = offer.id;
    world.offers.insert(offer).await.unwrap();
    world
        .items
        .sync_items(
            &ItemOwner::offer(offer_id),
            vec![
                PipelineItem {
                    id: uuid::Uuid::now_v7(),
                    description: "license".to_string(),
                    quantity: 1,
                    amount: 100.0,
                },
                PipelineItem {
                    id: uuid::Uuid::now_v7(),
                    description: "setup".to_string(),
                    quantity: 1,
                    amount: 25.0,
                },
            ],
        )
        .await
        .unwrap();

    let sale = world.lifecycle.convert_from_offer(offer_id, &actor).await.unwrap();

    assert_eq!(sale.customer_id, "C9");
    assert_eq!(sale.source_offer_id, Some(offer_id));
    assert_eq!(sale.totals.grand_total(), Some(125.0));
    assert_eq!(
        world.items.get_all_items(&ItemOwner::sale(sale.id)).await.unwrap().len(),
        2
    );
    assert!(world.offers.get(offer_id).await.unwrap().unwrap().converted);

    // Double conversion is blocked.
    let err = world.lifecycle.convert_from_offer(offer_id, &actor).await.unwrap_err();
    assert!(matches!(err, DomainError::BusinessRule(_)));
}

#[tokio::test]
async fn revert_undoes_a_conversion() {
    let world = build_world();
    let actor = plain_user("sales-rep");

    let offer = Offer::new(dealdesk_core::OfferId::new(), "C9", actor.id, Utc::now());
    let offer_id = offer.id;
    world.offers.insert(offer).await.unwrap();

    let sale = world.lifecycle.convert_from_offer(offer_id, &actor).await.unwrap();
    world.lifecycle.revert_from_offer(sale.id, &actor).await.unwrap();

    assert_eq!(world.lifecycle.find_one(sale.id).await.unwrap_err(), DomainError::NotFound);
    assert!(!world.offers.get(offer_id).await.unwrap().unwrap().converted);
    assert!(world.items.get_all_items(&ItemOwner::sale(sale.id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn reverting_a_sale_without_an_offer_is_a_business_error() {
    let world = build_world();
    let actor = plain_user("sales-rep");

    let sale = world
        .lifecycle
        .create(NewSale::for_customer("C1"), &actor)
        .await
        .unwrap();

    let err = world.lifecycle.revert_from_offer(sale.id, &actor).await.unwrap_err();
    assert!(matches!(err, DomainError::BusinessRule(_)));
}

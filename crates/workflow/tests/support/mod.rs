//! Shared wiring for the workflow integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use dealdesk_auth::{AuthenticatedUser, Role};
use dealdesk_core::UserId;
use dealdesk_infra::{
    InMemoryIdentityDirectory, InMemoryNotificationDispatch, InMemoryOfferStore,
    InMemoryPipelineItemsStore, InMemorySaleStore, InMemorySequenceCounter, InMemorySystemLog,
    PipelineTotalsCalculator,
};
use dealdesk_workflow::{ApprovalWorkflow, NotificationFanout, SaleLifecycleService};

pub struct World {
    pub sales: Arc<InMemorySaleStore>,
    pub offers: Arc<InMemoryOfferStore>,
    pub counter: Arc<InMemorySequenceCounter>,
    pub items: Arc<InMemoryPipelineItemsStore>,
    pub dispatch: Arc<InMemoryNotificationDispatch>,
    pub directory: Arc<InMemoryIdentityDirectory>,
    pub syslog: Arc<InMemorySystemLog>,
    pub lifecycle: Arc<SaleLifecycleService>,
    pub approvals: Arc<ApprovalWorkflow>,
}

pub fn build_world() -> World {
    dealdesk_observability::init();

    let sales = Arc::new(InMemorySaleStore::new());
    let offers = Arc::new(InMemoryOfferStore::new());
    let counter = Arc::new(InMemorySequenceCounter::new());
    let items = Arc::new(InMemoryPipelineItemsStore::new());
    let dispatch = Arc::new(InMemoryNotificationDispatch::new());
    let directory = Arc::new(InMemoryIdentityDirectory::new());
    let syslog = Arc::new(InMemorySystemLog::new());

    let calculator = Arc::new(PipelineTotalsCalculator::new(items.clone()));
    let lifecycle = Arc::new(SaleLifecycleService::new(
        sales.clone(),
        offers.clone(),
        counter.clone(),
        items.clone(),
        calculator,
    ));
    let fanout = NotificationFanout::new(dispatch.clone(), directory.clone());
    let approvals = Arc::new(ApprovalWorkflow::new(sales.clone(), fanout, syslog.clone()));

    World {
        sales,
        offers,
        counter,
        items,
        dispatch,
        directory,
        syslog,
        lifecycle,
        approvals,
    }
}

pub fn plain_user(name: &str) -> AuthenticatedUser {
    AuthenticatedUser::new(UserId::new(), name)
}

pub fn manager(name: &str) -> AuthenticatedUser {
    AuthenticatedUser::new(UserId::new(), name)
        .with_roles(vec![Role::new("Sales Manager")])
        .as_manager()
}

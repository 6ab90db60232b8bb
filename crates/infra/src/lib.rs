//! `dealdesk-infra` — port traits and in-memory implementations.
//!
//! Every collaborator the workflow layer talks to is an async trait here:
//! the sequence counter, the sale/offer stores, the pipeline-items store,
//! the totals calculator, the notification dispatch backend, the identity
//! directory and the system log sink. In-memory implementations back tests
//! and dev wiring; persistent backends can be swapped in behind the same
//! traits.

pub mod counter;
pub mod identity;
pub mod notify;
pub mod offer_store;
pub mod pipeline_items;
pub mod sale_store;
pub mod syslog;
pub mod totals;

pub use counter::{CounterError, InMemorySequenceCounter, SequenceCounter};
pub use identity::{IdentityDirectory, IdentityError, InMemoryIdentityDirectory};
pub use notify::{
    Channel, DispatchError, DispatchReceipt, DispatchRequest, InMemoryNotificationDispatch,
    NotificationDispatch,
};
pub use offer_store::{InMemoryOfferStore, OfferStore};
pub use pipeline_items::{InMemoryPipelineItemsStore, ItemOwner, PipelineItem, PipelineItemsStore};
pub use sale_store::{ConditionalUpdate, InMemorySaleStore, SaleStore, StoreError, SubmitOutcome};
pub use syslog::{InMemorySystemLog, SystemLog, SystemLogEntry, SystemLogError};
pub use totals::{CalculatorError, PipelineTotalsCalculator, TotalsCalculator};

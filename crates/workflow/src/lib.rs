//! `dealdesk-workflow` — orchestration of the sale lifecycle and the
//! manager sign-off workflow.
//!
//! Three services live here, each owning one slice of the control flow:
//!
//! - [`SaleLifecycleService`]: create/update/calculate/remove plus
//!   offer conversion, including the race-safe sale-number retry loop.
//! - [`ApprovalWorkflow`]: request/approve/reject/bulk-approve on top of
//!   the store's atomic conditional updates, gated by authorization.
//! - [`NotificationFanout`]: sequential, best-effort side effects; a
//!   notification or audit-log failure never rolls back a committed state
//!   transition.

pub mod approval;
pub mod lifecycle;
pub mod notify;
pub mod responses;

pub use approval::ApprovalWorkflow;
pub use lifecycle::{NewSale, SaleLifecycleService, SaleUpdate, SALE_NUMBER_COUNTER};
pub use notify::{NotificationFanout, APPROVER_ROLE_PATTERN};
pub use responses::{ApprovalAction, ApprovalActionOutcome, ApprovalRequestOutcome, BulkApprovalOutcome};

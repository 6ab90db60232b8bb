//! `dealdesk-sales` — the Sale aggregate and its two state machines.
//!
//! Everything in this crate is pure and IO-free: status transitions append
//! stage-history entries, the approval sub-state-machine enforces its
//! preconditions, and all clocks/actors arrive as explicit parameters.

pub mod approval;
pub mod offer;
pub mod sale;
pub mod stage_history;
pub mod status;

pub use approval::{ApprovalState, ApprovalStatus};
pub use offer::Offer;
pub use sale::{Sale, Totals};
pub use stage_history::StageHistoryEntry;
pub use status::SaleStatus;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dealdesk_core::UserId;

use crate::status::SaleStatus;

/// One status transition in a sale's audit trail.
///
/// Immutable once appended. `duration_in_stage` is the time spent in
/// `from_status`, measured from the previous entry's `changed_at` (or the
/// sale's creation time for the first entry) and clamped at zero so a
/// backwards clock adjustment can never produce a negative duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageHistoryEntry {
    pub from_status: SaleStatus,
    pub to_status: SaleStatus,
    pub changed_by: UserId,
    pub changed_at: DateTime<Utc>,
    pub duration_in_stage: Duration,
}

impl StageHistoryEntry {
    /// Build an entry for a transition happening at `now`.
    ///
    /// `entered_prior_stage_at` is when the sale entered `from_status`.
    pub fn new(
        from_status: SaleStatus,
        to_status: SaleStatus,
        changed_by: UserId,
        entered_prior_stage_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        // to_std() fails on negative deltas; that is exactly the clamp we want.
        let duration_in_stage = (now - entered_prior_stage_at).to_std().unwrap_or(Duration::ZERO);

        Self {
            from_status,
            to_status,
            changed_by,
            changed_at: now,
            duration_in_stage,
        }
    }
}

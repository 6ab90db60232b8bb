use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dealdesk_core::UserId;

/// Manager sign-off sub-state-machine, independent of the sale status.
///
/// `None → Pending → {Approved, Rejected}`, with `Pending → Pending` as an
/// explicit resubmission (clears any prior rejection reason, overwrites
/// requester/note/timestamp). Resubmission from `Approved` is also allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    None,
    Pending,
    Approved,
    Rejected,
}

/// Approval fields carried on the sale aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalState {
    pub status: ApprovalStatus,
    pub approved: bool,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub requested_by: Option<UserId>,
    pub requested_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub rejection_reason: Option<String>,
}

impl Default for ApprovalState {
    fn default() -> Self {
        Self {
            status: ApprovalStatus::None,
            approved: false,
            approved_by: None,
            approved_at: None,
            requested_by: None,
            requested_at: None,
            note: None,
            rejection_reason: None,
        }
    }
}

impl ApprovalState {
    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }

    /// (Re)submit for approval. Always moves to `Pending` and clears any
    /// prior rejection reason, whatever the current status is.
    pub fn submit(&mut self, requester: UserId, note: Option<String>, now: DateTime<Utc>) {
        self.status = ApprovalStatus::Pending;
        self.approved = false;
        self.requested_by = Some(requester);
        self.requested_at = Some(now);
        self.note = note;
        self.rejection_reason = None;
    }

    /// Record a granted approval. The caller must have already verified the
    /// `Pending` precondition under the store's atomic conditional update.
    pub fn grant(&mut self, approver: UserId, note: Option<String>, now: DateTime<Utc>) {
        self.status = ApprovalStatus::Approved;
        self.approved = true;
        self.approved_by = Some(approver);
        self.approved_at = Some(now);
        if note.is_some() {
            self.note = note;
        }
        self.rejection_reason = None;
    }

    /// Record a rejection. Same atomic `Pending` precondition as `grant`.
    pub fn deny(&mut self, approver: UserId, reason: String, now: DateTime<Utc>) {
        self.status = ApprovalStatus::Rejected;
        self.approved = false;
        self.approved_by = Some(approver);
        self.approved_at = Some(now);
        self.rejection_reason = Some(reason);
    }
}

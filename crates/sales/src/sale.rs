use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dealdesk_core::{DomainError, DomainResult, Entity, OfferId, SaleId, UserId};

use crate::approval::{ApprovalState, ApprovalStatus};
use crate::stage_history::StageHistoryEntry;
use crate::status::SaleStatus;

/// Opaque numeric totals refreshed by the external calculator.
///
/// This subsystem never computes these values; it only stores whatever the
/// calculator returned last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Totals(pub BTreeMap<String, f64>);

impl Totals {
    pub fn grand_total(&self) -> Option<f64> {
        self.0.get("grand_total").copied()
    }
}

/// Aggregate root: a commercial deal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    /// Human-facing sequential number, unique and strictly increasing across
    /// all sales ever created. Assigned once at creation.
    pub no: u64,
    pub customer_id: String,
    pub status: SaleStatus,
    pub stage_history: Vec<StageHistoryEntry>,
    pub approval: ApprovalState,
    pub totals: Totals,
    /// Set when this sale was created by converting an offer.
    pub source_offer_id: Option<OfferId>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Sale {
    type Id = SaleId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Sale {
    pub fn new(
        id: SaleId,
        no: u64,
        customer_id: impl Into<String>,
        status: SaleStatus,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            no,
            customer_id: customer_id.into(),
            status,
            stage_history: Vec::new(),
            approval: ApprovalState::default(),
            totals: Totals::default(),
            source_offer_id: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// When the sale entered its current status: the last stage-history
    /// entry's timestamp, or the creation time before any transition.
    pub fn entered_current_stage_at(&self) -> DateTime<Utc> {
        self.stage_history
            .last()
            .map(|e| e.changed_at)
            .unwrap_or(self.created_at)
    }

    /// Apply a status change, appending exactly one stage-history entry.
    ///
    /// The entry's `from_status` is the **pre-update** snapshot of `status`;
    /// a same-status update appends nothing. Returns whether a transition
    /// happened.
    pub fn change_status(&mut self, to: SaleStatus, actor: UserId, now: DateTime<Utc>) -> bool {
        if self.status == to {
            return false;
        }

        let entry = StageHistoryEntry::new(
            self.status,
            to,
            actor,
            self.entered_current_stage_at(),
            now,
        );
        self.stage_history.push(entry);
        self.status = to;
        self.updated_at = now;
        true
    }

    /// (Re)submit for manager approval. Returns true when the sale was
    /// already pending or approved (informational, not an error).
    pub fn submit_for_approval(
        &mut self,
        requester: UserId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> bool {
        let already = matches!(
            self.approval.status,
            ApprovalStatus::Pending | ApprovalStatus::Approved
        );
        self.approval.submit(requester, note, now);
        self.updated_at = now;
        already
    }

    /// Grant approval. Fails unless the approval status is `Pending`.
    pub fn approve(
        &mut self,
        approver: UserId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !self.approval.is_pending() {
            return Err(DomainError::business_rule(format!(
                "sale {} is not pending approval",
                self.no
            )));
        }
        self.approval.grant(approver, note, now);
        self.updated_at = now;
        Ok(())
    }

    /// Reject a pending approval. The reason must be non-blank.
    pub fn reject(
        &mut self,
        approver: UserId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if reason.trim().is_empty() {
            return Err(DomainError::business_rule(
                "a rejection reason is required",
            ));
        }
        if !self.approval.is_pending() {
            return Err(DomainError::business_rule(format!(
                "sale {} is not pending approval",
                self.no
            )));
        }
        self.approval.deny(approver, reason.trim().to_string(), now);
        self.updated_at = now;
        Ok(())
    }

    /// Replace the stored totals with a fresh calculator result.
    pub fn set_totals(&mut self, totals: Totals, now: DateTime<Utc>) {
        self.totals = totals;
        self.updated_at = now;
    }
}

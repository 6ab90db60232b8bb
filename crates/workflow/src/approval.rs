//! Manager sign-off workflow.
//!
//! State transitions commit through the store's atomic conditional updates;
//! notifications and audit-log records happen after commit and are strictly
//! best-effort. Authorization is checked once per operation, before any
//! write.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::warn;

use dealdesk_auth::{ensure_can_approve, AuthenticatedUser};
use dealdesk_core::{DomainError, DomainResult, SaleId};
use dealdesk_infra::{ConditionalUpdate, SaleStore, SystemLog, SystemLogEntry};
use dealdesk_sales::Sale;

use crate::notify::NotificationFanout;
use crate::responses::{
    ApprovalAction, ApprovalActionOutcome, ApprovalRequestOutcome, BulkApprovalOutcome,
};

const LOG_MODULE: &str = "sales";
const LOG_CATEGORY: &str = "approval";

pub struct ApprovalWorkflow {
    sales: Arc<dyn SaleStore>,
    notifications: NotificationFanout,
    syslog: Arc<dyn SystemLog>,
}

impl ApprovalWorkflow {
    pub fn new(
        sales: Arc<dyn SaleStore>,
        notifications: NotificationFanout,
        syslog: Arc<dyn SystemLog>,
    ) -> Self {
        Self {
            sales,
            notifications,
            syslog,
        }
    }

    /// Submit sales for approval. Every matched sale moves to pending,
    /// whatever its current approval status; already-pending/approved ids
    /// are reported back informationally. Fails only when zero ids matched.
    pub async fn request_approval(
        &self,
        sale_ids: &[SaleId],
        requester: &AuthenticatedUser,
        note: Option<String>,
    ) -> DomainResult<ApprovalRequestOutcome> {
        let outcome = self
            .sales
            .submit_for_approval(sale_ids, requester.id, note, Utc::now())
            .await?;

        if outcome.updated.is_empty() {
            return Err(DomainError::NotFound);
        }

        let mut submitted = Vec::with_capacity(outcome.updated.len());
        for id in &outcome.updated {
            if let Some(sale) = self.sales.get(*id).await? {
                submitted.push(sale);
            }
        }
        self.notifications.notify_approvers(&submitted, requester).await;

        Ok(ApprovalRequestOutcome {
            success: true,
            updated_count: outcome.updated.len(),
            message: format!("{} sale(s) submitted for approval", outcome.updated.len()),
            sale_ids: outcome.updated,
            already_pending: outcome.already_pending,
        })
    }

    /// Approve one pending sale. Exactly one of two racing approvers wins:
    /// the pending check and the write are a single conditional update.
    pub async fn approve_sale(
        &self,
        sale_id: SaleId,
        approver: &AuthenticatedUser,
        note: Option<String>,
    ) -> DomainResult<ApprovalActionOutcome> {
        ensure_can_approve(approver)?;

        let sale = match self
            .sales
            .approve_if_pending(sale_id, approver.id, note, Utc::now())
            .await?
        {
            ConditionalUpdate::Applied(sale) => sale,
            ConditionalUpdate::Missing => return Err(DomainError::NotFound),
            ConditionalUpdate::NotPending => {
                return Err(DomainError::business_rule("sale is not pending approval"));
            }
        };

        self.notifications
            .notify_requester(&sale, ApprovalAction::Approved)
            .await;
        self.audit(&sale, approver, "approve", json!({ "note": sale.approval.note }))
            .await;

        Ok(ApprovalActionOutcome {
            success: true,
            sale_id,
            action: ApprovalAction::Approved,
            message: format!("sale {} approved", sale.no),
        })
    }

    /// Reject one pending sale; the reason is mandatory and non-blank.
    pub async fn reject_sale(
        &self,
        sale_id: SaleId,
        approver: &AuthenticatedUser,
        reason: &str,
    ) -> DomainResult<ApprovalActionOutcome> {
        ensure_can_approve(approver)?;
        if reason.trim().is_empty() {
            return Err(DomainError::business_rule("a rejection reason is required"));
        }

        let sale = match self
            .sales
            .reject_if_pending(sale_id, approver.id, reason.trim().to_string(), Utc::now())
            .await?
        {
            ConditionalUpdate::Applied(sale) => sale,
            ConditionalUpdate::Missing => return Err(DomainError::NotFound),
            ConditionalUpdate::NotPending => {
                return Err(DomainError::business_rule("sale is not pending approval"));
            }
        };

        self.notifications
            .notify_requester(&sale, ApprovalAction::Rejected)
            .await;
        self.audit(
            &sale,
            approver,
            "reject",
            json!({ "reason": sale.approval.rejection_reason }),
        )
        .await;

        Ok(ApprovalActionOutcome {
            success: true,
            sale_id,
            action: ApprovalAction::Rejected,
            message: format!("sale {} rejected", sale.no),
        })
    }

    /// Approve every currently-pending sale in the selection with one bulk
    /// write. Non-pending ids are silently excluded; an empty eligible set
    /// is an error. Requesters are then notified one by one, each attempt
    /// isolated.
    pub async fn bulk_approve(
        &self,
        sale_ids: &[SaleId],
        approver: &AuthenticatedUser,
        note: Option<String>,
    ) -> DomainResult<BulkApprovalOutcome> {
        ensure_can_approve(approver)?;

        let updated = self
            .sales
            .approve_all_pending(sale_ids, approver.id, note, Utc::now())
            .await?;
        if updated.is_empty() {
            return Err(DomainError::business_rule(
                "no pending sales in the selection",
            ));
        }

        for sale in &updated {
            self.notifications
                .notify_requester(sale, ApprovalAction::Approved)
                .await;
        }
        self.audit_bulk(&updated, approver).await;

        Ok(BulkApprovalOutcome {
            success: true,
            updated_count: updated.len(),
            sale_ids: updated.iter().map(|s| s.id).collect(),
            message: format!("{} sale(s) approved", updated.len()),
        })
    }

    /// Pending sales, most recently requested first.
    pub async fn get_pending_approvals(&self) -> DomainResult<Vec<Sale>> {
        Ok(self.sales.list_pending_approvals().await?)
    }

    /// Fire-and-forget audit record; a sink failure never surfaces.
    async fn audit(
        &self,
        sale: &Sale,
        approver: &AuthenticatedUser,
        action: &str,
        details: serde_json::Value,
    ) {
        let entry = SystemLogEntry {
            user_id: Some(approver.id),
            entity_id: Some(sale.id.into()),
            status: "success".to_string(),
            details,
        };
        if let Err(e) = self.syslog.record(LOG_CATEGORY, action, LOG_MODULE, entry).await {
            warn!(sale_id = %sale.id, action, error = %e, "system log write failed");
        }
    }

    async fn audit_bulk(&self, sales: &[Sale], approver: &AuthenticatedUser) {
        let entry = SystemLogEntry {
            user_id: Some(approver.id),
            entity_id: None,
            status: "success".to_string(),
            details: json!({
                "count": sales.len(),
                "sale_nos": sales.iter().map(|s| s.no).collect::<Vec<_>>(),
            }),
        };
        if let Err(e) = self
            .syslog
            .record(LOG_CATEGORY, "bulk_approve", LOG_MODULE, entry)
            .await
        {
            warn!(error = %e, "system log write failed");
        }
    }
}

//! Best-effort notification fan-out.
//!
//! Resolves the approver audience (identity-directory role lookup) and the
//! requester recorded on the sale, then attempts delivery per recipient.
//! Attempts run **sequentially** to bound load on the notification backend,
//! and every attempt is isolated: a failure is logged and swallowed, it
//! never reaches the calling workflow operation and never blocks delivery
//! to later recipients. Retry/backoff is the backend's job, not ours.

use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use dealdesk_auth::AuthenticatedUser;
use dealdesk_infra::{Channel, DispatchRequest, IdentityDirectory, NotificationDispatch};
use dealdesk_sales::Sale;

use crate::responses::ApprovalAction;

/// Role-name pattern the identity provider uses for the approver audience.
pub const APPROVER_ROLE_PATTERN: &str = "manager|admin|owner";

const TEMPLATE_APPROVAL_REQUESTED: &str = "sale_approval_requested";
const TEMPLATE_APPROVED: &str = "sale_approved";
const TEMPLATE_REJECTED: &str = "sale_rejected";

pub struct NotificationFanout {
    dispatch: Arc<dyn NotificationDispatch>,
    directory: Arc<dyn IdentityDirectory>,
}

impl NotificationFanout {
    pub fn new(
        dispatch: Arc<dyn NotificationDispatch>,
        directory: Arc<dyn IdentityDirectory>,
    ) -> Self {
        Self { dispatch, directory }
    }

    /// Tell every approver (except the requester) that these sales await
    /// sign-off. Best-effort: always returns.
    pub async fn notify_approvers(&self, sales: &[Sale], requester: &AuthenticatedUser) {
        let audience = match self.directory.find_by_role_pattern(APPROVER_ROLE_PATTERN).await {
            Ok(audience) => audience,
            Err(e) => {
                warn!(error = %e, "approver audience lookup failed, skipping notifications");
                return;
            }
        };

        for sale in sales {
            for recipient in audience.iter().filter(|u| u.id != requester.id) {
                self.attempt(DispatchRequest {
                    template_code: TEMPLATE_APPROVAL_REQUESTED.to_string(),
                    channel: Channel::InApp,
                    recipient: recipient.id,
                    context_type: "sale".to_string(),
                    context_id: sale.id.into(),
                    template_data: json!({
                        "sale_no": sale.no,
                        "customer_id": sale.customer_id,
                        "requested_by": requester.name,
                    }),
                })
                .await;
            }
        }
    }

    /// Tell the requester recorded on the sale about a decision.
    /// Best-effort: always returns.
    pub async fn notify_requester(&self, sale: &Sale, action: ApprovalAction) {
        let Some(recipient) = sale.approval.requested_by else {
            return;
        };

        let template_code = match action {
            ApprovalAction::Approved => TEMPLATE_APPROVED,
            ApprovalAction::Rejected => TEMPLATE_REJECTED,
        };

        self.attempt(DispatchRequest {
            template_code: template_code.to_string(),
            channel: Channel::InApp,
            recipient,
            context_type: "sale".to_string(),
            context_id: sale.id.into(),
            template_data: json!({
                "sale_no": sale.no,
                "customer_id": sale.customer_id,
                "rejection_reason": sale.approval.rejection_reason,
            }),
        })
        .await;
    }

    async fn attempt(&self, request: DispatchRequest) {
        let recipient = request.recipient;
        let template = request.template_code.clone();
        match self.dispatch.dispatch(request).await {
            Ok(receipt) if !receipt.success => {
                warn!(
                    %recipient,
                    template,
                    error = receipt.error.as_deref().unwrap_or("unknown"),
                    "notification rejected by backend"
                );
            }
            Err(e) => {
                warn!(%recipient, template, error = %e, "notification dispatch failed");
            }
            Ok(_) => {}
        }
    }
}

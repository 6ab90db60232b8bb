//! Caller-facing outcome DTOs.

use serde::{Deserialize, Serialize};

use dealdesk_core::SaleId;

/// Which approval decision an outcome describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    Approved,
    Rejected,
}

/// Outcome of `request_approval`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequestOutcome {
    pub success: bool,
    pub updated_count: usize,
    pub sale_ids: Vec<SaleId>,
    pub message: String,
    /// Ids that were already pending or approved before this request.
    /// Informational: they were still re-submitted.
    pub already_pending: Vec<SaleId>,
}

/// Outcome of `approve_sale` / `reject_sale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalActionOutcome {
    pub success: bool,
    pub sale_id: SaleId,
    pub action: ApprovalAction,
    pub message: String,
}

/// Outcome of `bulk_approve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkApprovalOutcome {
    pub success: bool,
    pub updated_count: usize,
    pub sale_ids: Vec<SaleId>,
    pub message: String,
}

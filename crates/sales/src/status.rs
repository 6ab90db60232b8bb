use serde::{Deserialize, Serialize};

/// Sale status lifecycle.
///
/// Any state may transition to any other; legality is decided by
/// authorization/business rules at the workflow layer, not by an adjacency
/// graph. What the domain guarantees is the audit trail: every transition
/// appends exactly one stage-history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,
    CollectionWaiting,
    SetupWaiting,
    TrainingWaiting,
    Active,
    Completed,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::CollectionWaiting => "collection_waiting",
            SaleStatus::SetupWaiting => "setup_waiting",
            SaleStatus::TrainingWaiting => "training_waiting",
            SaleStatus::Active => "active",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Sale persistence port.
//!
//! The store owns two correctness-sensitive guarantees:
//!
//! - `insert` enforces the unique index on the sale number and reports a
//!   `DuplicateNo` conflict, which the lifecycle service turns into a
//!   counter resync + retry.
//! - the approval writes are **atomic conditional updates**: the pending
//!   precondition is checked and the mutation applied under one lock
//!   acquisition, the moral equivalent of
//!   `UPDATE ... WHERE approval_status = 'pending'` with an affected-row
//!   check. Two racing approvers cannot both win.
//!
//! Everything else is last-write-wins at document granularity.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use dealdesk_core::{DomainError, Entity, SaleId, UserId};
use dealdesk_sales::Sale;

/// Store operation error (infrastructure-level).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-index violation on the sale number.
    #[error("duplicate sale number {0}")]
    DuplicateNo(u64),

    #[error("sale not found")]
    NotFound,

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateNo(no) => DomainError::conflict(format!("duplicate sale number {no}")),
            StoreError::NotFound => DomainError::NotFound,
            StoreError::Backend(msg) => DomainError::conflict(msg),
        }
    }
}

/// Result of an atomic conditional approval write.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalUpdate {
    /// Exactly one record matched the pending precondition and was updated.
    Applied(Sale),
    /// The record exists but was not pending; nothing was written.
    NotPending,
    /// No record with that id.
    Missing,
}

/// Result of a bulk submit-for-approval write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitOutcome {
    /// Ids that matched and were moved to pending.
    pub updated: Vec<SaleId>,
    /// Subset of `updated` that was already pending or approved before the
    /// write (informational, they were still re-submitted).
    pub already_pending: Vec<SaleId>,
}

#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Insert a new sale. Fails with [`StoreError::DuplicateNo`] when the
    /// sale number is already taken.
    async fn insert(&self, sale: Sale) -> Result<(), StoreError>;

    async fn get(&self, id: SaleId) -> Result<Option<Sale>, StoreError>;

    /// Full-document write of an existing sale (last-write-wins).
    async fn put(&self, sale: Sale) -> Result<(), StoreError>;

    /// Delete a sale; returns whether it existed.
    async fn delete(&self, id: SaleId) -> Result<bool, StoreError>;

    async fn list(&self) -> Result<Vec<Sale>, StoreError>;

    /// Highest sale number currently in the store (0 when empty). Feeds
    /// counter resync after a duplicate-number conflict.
    async fn max_no(&self) -> Result<u64, StoreError>;

    /// Move every matched sale to approval-pending in one write, whatever
    /// its current approval status. Unknown ids are skipped.
    async fn submit_for_approval(
        &self,
        ids: &[SaleId],
        requester: UserId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, StoreError>;

    /// Approve iff currently pending (atomic conditional update).
    async fn approve_if_pending(
        &self,
        id: SaleId,
        approver: UserId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ConditionalUpdate, StoreError>;

    /// Reject iff currently pending (atomic conditional update).
    async fn reject_if_pending(
        &self,
        id: SaleId,
        approver: UserId,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<ConditionalUpdate, StoreError>;

    /// Approve every id that is currently pending, in one write. Ids that
    /// are unknown or not pending are silently excluded. Returns the
    /// updated sales.
    async fn approve_all_pending(
        &self,
        ids: &[SaleId],
        approver: UserId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sale>, StoreError>;

    /// Pending sales, sorted by approval-request timestamp descending.
    async fn list_pending_approvals(&self) -> Result<Vec<Sale>, StoreError>;
}

/// In-memory sale store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySaleStore {
    inner: RwLock<HashMap<SaleId, Sale>>,
}

impl InMemorySaleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<SaleId, Sale>>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("sale store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<SaleId, Sale>>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("sale store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SaleStore for InMemorySaleStore {
    async fn insert(&self, sale: Sale) -> Result<(), StoreError> {
        let mut map = self.write()?;
        if map.values().any(|existing| existing.no == sale.no) {
            return Err(StoreError::DuplicateNo(sale.no));
        }
        map.insert(sale.id(), sale);
        Ok(())
    }

    async fn get(&self, id: SaleId) -> Result<Option<Sale>, StoreError> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn put(&self, sale: Sale) -> Result<(), StoreError> {
        let mut map = self.write()?;
        if !map.contains_key(&sale.id) {
            return Err(StoreError::NotFound);
        }
        map.insert(sale.id(), sale);
        Ok(())
    }

    async fn delete(&self, id: SaleId) -> Result<bool, StoreError> {
        Ok(self.write()?.remove(&id).is_some())
    }

    async fn list(&self) -> Result<Vec<Sale>, StoreError> {
        let mut sales: Vec<Sale> = self.read()?.values().cloned().collect();
        sales.sort_by_key(|s| s.no);
        Ok(sales)
    }

    async fn max_no(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.values().map(|s| s.no).max().unwrap_or(0))
    }

    async fn submit_for_approval(
        &self,
        ids: &[SaleId],
        requester: UserId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, StoreError> {
        let mut map = self.write()?;
        let mut outcome = SubmitOutcome::default();
        for id in ids {
            if let Some(sale) = map.get_mut(id) {
                let already = sale.submit_for_approval(requester, note.clone(), now);
                outcome.updated.push(*id);
                if already {
                    outcome.already_pending.push(*id);
                }
            }
        }
        Ok(outcome)
    }

    async fn approve_if_pending(
        &self,
        id: SaleId,
        approver: UserId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ConditionalUpdate, StoreError> {
        let mut map = self.write()?;
        let Some(sale) = map.get_mut(&id) else {
            return Ok(ConditionalUpdate::Missing);
        };
        if !sale.approval.is_pending() {
            return Ok(ConditionalUpdate::NotPending);
        }
        // Cannot fail: the pending check above holds under this lock.
        if sale.approve(approver, note, now).is_err() {
            return Ok(ConditionalUpdate::NotPending);
        }
        Ok(ConditionalUpdate::Applied(sale.clone()))
    }

    async fn reject_if_pending(
        &self,
        id: SaleId,
        approver: UserId,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<ConditionalUpdate, StoreError> {
        let mut map = self.write()?;
        let Some(sale) = map.get_mut(&id) else {
            return Ok(ConditionalUpdate::Missing);
        };
        if !sale.approval.is_pending() {
            return Ok(ConditionalUpdate::NotPending);
        }
        if sale.reject(approver, &reason, now).is_err() {
            return Ok(ConditionalUpdate::NotPending);
        }
        Ok(ConditionalUpdate::Applied(sale.clone()))
    }

    async fn approve_all_pending(
        &self,
        ids: &[SaleId],
        approver: UserId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sale>, StoreError> {
        let mut map = self.write()?;
        let mut updated = Vec::new();
        for id in ids {
            if let Some(sale) = map.get_mut(id) {
                if sale.approval.is_pending() && sale.approve(approver, note.clone(), now).is_ok() {
                    updated.push(sale.clone());
                }
            }
        }
        Ok(updated)
    }

    async fn list_pending_approvals(&self) -> Result<Vec<Sale>, StoreError> {
        let mut pending: Vec<Sale> = self
            .read()?
            .values()
            .filter(|s| s.approval.is_pending())
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.approval.requested_at.cmp(&a.approval.requested_at));
        Ok(pending)
    }
}

//! System log sink: append-only, fire-and-forget audit records.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use dealdesk_core::UserId;

#[derive(Debug, Error)]
pub enum SystemLogError {
    #[error("system log sink failure: {0}")]
    Sink(String),
}

/// One audit record. Callers never block on, or fail because of, this sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemLogEntry {
    pub user_id: Option<UserId>,
    pub entity_id: Option<Uuid>,
    pub status: String,
    pub details: JsonValue,
}

#[async_trait]
pub trait SystemLog: Send + Sync {
    async fn record(
        &self,
        category: &str,
        action: &str,
        module: &str,
        entry: SystemLogEntry,
    ) -> Result<(), SystemLogError>;
}

/// In-memory log sink with failure injection.
#[derive(Debug, Default)]
pub struct InMemorySystemLog {
    records: Mutex<Vec<(String, String, String, SystemLogEntry)>>,
    fail_all: AtomicBool,
}

impl InMemorySystemLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_everything(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<(String, String, String, SystemLogEntry)> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SystemLog for InMemorySystemLog {
    async fn record(
        &self,
        category: &str,
        action: &str,
        module: &str,
        entry: SystemLogEntry,
    ) -> Result<(), SystemLogError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(SystemLogError::Sink("simulated outage".to_string()));
        }
        let mut records = self
            .records
            .lock()
            .map_err(|_| SystemLogError::Sink("log lock poisoned".to_string()))?;
        records.push((
            category.to_string(),
            action.to_string(),
            module.to_string(),
            entry,
        ));
        Ok(())
    }
}

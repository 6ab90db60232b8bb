//! Notification dispatch port.
//!
//! This is only the delivery backend boundary. Reliability (retry/backoff,
//! templating, channel routing) belongs to the backend; callers treat every
//! dispatch as best-effort and must tolerate failure.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use dealdesk_core::UserId;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("notification backend failure: {0}")]
    Backend(String),
}

/// Delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    InApp,
    Email,
}

/// One delivery attempt for one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub template_code: String,
    pub channel: Channel,
    pub recipient: UserId,
    pub context_type: String,
    pub context_id: Uuid,
    pub template_data: JsonValue,
}

/// Backend acknowledgement for a single attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    pub success: bool,
    pub message_id: Option<Uuid>,
    pub error: Option<String>,
}

#[async_trait]
pub trait NotificationDispatch: Send + Sync {
    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchReceipt, DispatchError>;
}

/// In-memory dispatch backend with per-recipient failure injection.
#[derive(Debug, Default)]
pub struct InMemoryNotificationDispatch {
    sent: Mutex<Vec<DispatchRequest>>,
    fail_for: Mutex<HashSet<UserId>>,
    fail_all: AtomicBool,
}

impl InMemoryNotificationDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent dispatch fails (outage simulation).
    pub fn fail_everything(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    /// Dispatches to this recipient fail; others succeed.
    pub fn fail_for(&self, recipient: UserId) {
        if let Ok(mut set) = self.fail_for.lock() {
            set.insert(recipient);
        }
    }

    /// Requests the backend accepted so far.
    pub fn sent(&self) -> Vec<DispatchRequest> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationDispatch for InMemoryNotificationDispatch {
    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchReceipt, DispatchError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(DispatchError::Backend("simulated outage".to_string()));
        }
        if self
            .fail_for
            .lock()
            .map(|set| set.contains(&request.recipient))
            .unwrap_or(false)
        {
            return Err(DispatchError::Backend(format!(
                "simulated failure for recipient {}",
                request.recipient
            )));
        }

        let mut sent = self
            .sent
            .lock()
            .map_err(|_| DispatchError::Backend("dispatch lock poisoned".to_string()))?;
        sent.push(request);
        Ok(DispatchReceipt {
            success: true,
            message_id: Some(Uuid::now_v7()),
            error: None,
        })
    }
}

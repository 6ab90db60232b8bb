use serde::{Deserialize, Serialize};

use dealdesk_core::{DomainError, DomainResult, UserId};

use crate::Role;

/// A fully resolved authenticated user for authorization decisions.
///
/// Construction of this object is intentionally decoupled from storage and
/// transport: the host derives the capability flags from SSO claims and a
/// policy source before any workflow operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub name: String,
    pub roles: Vec<Role>,
    pub is_admin: bool,
    pub is_manager: bool,
    pub is_finance: bool,
}

impl AuthenticatedUser {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            roles: Vec::new(),
            is_admin: false,
            is_manager: false,
            is_finance: false,
        }
    }

    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    pub fn as_manager(mut self) -> Self {
        self.is_manager = true;
        self
    }

    pub fn as_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// Whether this user may approve or reject pending sales.
    pub fn can_approve(&self) -> bool {
        self.is_manager || self.is_admin
    }
}

/// Authorize an approval-workflow action.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn ensure_can_approve(user: &AuthenticatedUser) -> DomainResult<()> {
    if user.can_approve() {
        Ok(())
    } else {
        Err(DomainError::Unauthorized)
    }
}

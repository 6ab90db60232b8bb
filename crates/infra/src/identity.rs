//! Identity directory port: role lookups for audience resolution.

use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use dealdesk_auth::AuthenticatedUser;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider failure: {0}")]
    Provider(String),
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Users holding at least one role whose name matches `pattern`.
    ///
    /// `pattern` is a `|`-separated list of case-insensitive substrings
    /// (e.g. `"manager|admin|owner"`), mirroring the role-name pattern the
    /// identity provider exposes.
    async fn find_by_role_pattern(
        &self,
        pattern: &str,
    ) -> Result<Vec<AuthenticatedUser>, IdentityError>;
}

/// In-memory directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryIdentityDirectory {
    users: RwLock<Vec<AuthenticatedUser>>,
}

impl InMemoryIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: AuthenticatedUser) {
        if let Ok(mut users) = self.users.write() {
            users.push(user);
        }
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn find_by_role_pattern(
        &self,
        pattern: &str,
    ) -> Result<Vec<AuthenticatedUser>, IdentityError> {
        let needles: Vec<String> = pattern
            .split('|')
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        let users = self
            .users
            .read()
            .map_err(|_| IdentityError::Provider("directory lock poisoned".to_string()))?;

        Ok(users
            .iter()
            .filter(|user| {
                user.roles.iter().any(|role| {
                    let name = role.as_str().to_lowercase();
                    needles.iter().any(|needle| name.contains(needle))
                })
            })
            .cloned()
            .collect())
    }
}

//! In-memory user accounts for tests and local runs.

use async_trait::async_trait;
use chrono::FixedOffset;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::UserAccounts;

#[derive(Debug, Default)]
struct Account {
    timezone: Option<FixedOffset>,
    roles: BTreeSet<String>,
}

/// User accounts held in a map, created on first touch.
#[derive(Debug, Default)]
pub struct InMemoryUserAccounts {
    accounts: RwLock<HashMap<UserId, Account>>,
    fail_role_changes: AtomicBool,
}

impl InMemoryUserAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_timezone(&self, user: &UserId, offset: FixedOffset) {
        self.write().entry(user.clone()).or_default().timezone = Some(offset);
    }

    /// Makes every grant/revoke fail, to simulate an unavailable user system.
    pub fn fail_role_changes(&self, fail: bool) {
        self.fail_role_changes.store(fail, Ordering::SeqCst);
    }

    /// Roles currently held by a user, sorted.
    pub fn roles_of(&self, user: &UserId) -> Vec<String> {
        self.read()
            .get(user)
            .map(|account| account.roles.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.fail_role_changes.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "user system unavailable",
            ));
        }
        Ok(())
    }

    // Map contents stay consistent even if a writer panicked.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<UserId, Account>> {
        self.accounts.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<UserId, Account>> {
        self.accounts.write().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl UserAccounts for InMemoryUserAccounts {
    async fn timezone_of(&self, user: &UserId) -> Result<Option<FixedOffset>, DomainError> {
        Ok(self.read().get(user).and_then(|account| account.timezone))
    }

    async fn has_role(&self, user: &UserId, role: &str) -> Result<bool, DomainError> {
        Ok(self
            .read()
            .get(user)
            .map_or(false, |account| account.roles.contains(role)))
    }

    async fn grant_role(&self, user: &UserId, role: &str) -> Result<(), DomainError> {
        self.check_available()?;
        self.write()
            .entry(user.clone())
            .or_default()
            .roles
            .insert(role.to_string());
        Ok(())
    }

    async fn revoke_role(&self, user: &UserId, role: &str) -> Result<(), DomainError> {
        self.check_available()?;
        if let Some(account) = self.write().get_mut(user) {
            account.roles.remove(role);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> UserId {
        UserId::new("alice").unwrap()
    }

    #[tokio::test]
    async fn roles_are_granted_and_revoked() {
        let users = InMemoryUserAccounts::new();

        users.grant_role(&alice(), "editor").await.unwrap();
        users.grant_role(&alice(), "editor").await.unwrap();
        assert_eq!(users.roles_of(&alice()), vec!["editor"]);

        users.revoke_role(&alice(), "editor").await.unwrap();
        assert!(!users.has_role(&alice(), "editor").await.unwrap());
    }

    #[tokio::test]
    async fn unknown_user_has_no_timezone() {
        let users = InMemoryUserAccounts::new();
        assert_eq!(users.timezone_of(&alice()).await.unwrap(), None);

        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        users.set_timezone(&alice(), offset);
        assert_eq!(users.timezone_of(&alice()).await.unwrap(), Some(offset));
    }

    #[tokio::test]
    async fn failure_mode_rejects_role_changes() {
        let users = InMemoryUserAccounts::new();
        users.fail_role_changes(true);
        assert!(users.grant_role(&alice(), "editor").await.is_err());
        assert!(users.roles_of(&alice()).is_empty());
    }
}

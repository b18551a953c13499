//! User accounts port.
//!
//! The external user system: timezone lookup for calendar-sensitive expiry
//! and the role operations the role license type manipulates.

use async_trait::async_trait;
use chrono::FixedOffset;

use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait UserAccounts: Send + Sync {
    /// The user's UTC offset, or `None` when the user has not set one.
    async fn timezone_of(&self, user: &UserId) -> Result<Option<FixedOffset>, DomainError>;

    async fn has_role(&self, user: &UserId, role: &str) -> Result<bool, DomainError>;

    /// Adds a role. Granting a role the user already has is not an error.
    async fn grant_role(&self, user: &UserId, role: &str) -> Result<(), DomainError>;

    /// Removes a role. Revoking a missing role is not an error.
    async fn revoke_role(&self, user: &UserId, role: &str) -> Result<(), DomainError>;
}

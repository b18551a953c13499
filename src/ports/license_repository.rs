//! License repository port.
//!
//! Persists and loads License aggregates. Creation of new records from a
//! purchase lives in `LicenseFactory`; this port only stores them.
//!
//! Writers are not coordinated: two writers updating the same license
//! resolve as last write wins.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, LicenseId, OfferingId, UserId};
use crate::domain::licensing::License;

/// Repository port for License aggregate persistence.
#[async_trait]
pub trait LicenseRepository: Send + Sync {
    /// Save a new license.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if a license with the same id exists
    /// - `DatabaseError` on persistence failure
    async fn save(&self, license: &License) -> Result<(), DomainError>;

    /// Overwrite an existing license.
    ///
    /// # Errors
    ///
    /// - `LicenseNotFound` if the license does not exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, license: &License) -> Result<(), DomainError>;

    /// Find a license by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &LicenseId) -> Result<Option<License>, DomainError>;

    /// All licenses owned by a user, oldest first.
    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<License>, DomainError>;

    /// Licenses an owner holds for one offering, oldest first.
    async fn find_by_offering_and_owner(
        &self,
        offering: &OfferingId,
        owner: &UserId,
    ) -> Result<Vec<License>, DomainError>;

    /// Remove a license.
    ///
    /// # Errors
    ///
    /// - `LicenseNotFound` if the license does not exist
    async fn delete(&self, id: &LicenseId) -> Result<(), DomainError>;
}

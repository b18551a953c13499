//! License type strategy contract.

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::licensing::{FieldSchema, License, LicenseError, LicenseFields};

/// Static description of a license kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseTypeDescriptor {
    /// Registry key, stored on every license of this kind.
    pub id: String,
    /// Human-readable name.
    pub label: String,
    /// Strategy can tell whether a customer already holds the privilege.
    pub existing_rights: bool,
    /// Owner may not be corrected once the license was granted.
    pub locks_owner: bool,
}

impl LicenseTypeDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            existing_rights: false,
            locks_owner: false,
        }
    }

    pub fn with_existing_rights(mut self) -> Self {
        self.existing_rights = true;
        self
    }

    pub fn with_owner_lock(mut self) -> Self {
        self.locks_owner = true;
        self
    }
}

/// Outcome of an existing-rights check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistingRights {
    None,
    Held { message: String },
}

/// Behaviour of one license kind.
///
/// Strategies are stateless. At offering design time they are paired with
/// settings (see [`ConfiguredLicenseType`](super::ConfiguredLicenseType));
/// at run time they read the license's own fields, which use the same names.
#[async_trait]
pub trait LicenseTypeStrategy: Send + Sync {
    fn descriptor(&self) -> LicenseTypeDescriptor;

    /// Fields this kind stores on a license.
    fn field_schema(&self) -> FieldSchema;

    /// Display label for a license of this kind.
    fn label(&self, license: &License) -> String;

    /// Applies the privilege. Called once per entry into `active`.
    async fn grant_license(&self, license: &License) -> Result<(), LicenseError>;

    /// Withdraws the privilege. Called once per exit from `active`.
    async fn revoke_license(&self, license: &License) -> Result<(), LicenseError>;

    /// Checks whether `owner` already holds what `settings` would grant.
    ///
    /// Only consulted when the descriptor declares `existing_rights`.
    async fn existing_rights(
        &self,
        _owner: &UserId,
        _settings: &LicenseFields,
    ) -> Result<ExistingRights, LicenseError> {
        Ok(ExistingRights::None)
    }
}

//! Reference strategy: a license that grants a user role.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::licensing::{
    FieldKind, FieldSchema, License, LicenseError, LicenseFields,
};
use crate::ports::UserAccounts;

use super::{ExistingRights, LicenseTypeDescriptor, LicenseTypeStrategy};

/// Field holding the role identifier.
pub const ROLE_FIELD: &str = "role";

/// Grants the configured role to the license owner while active.
pub struct RoleLicenseType {
    users: Arc<dyn UserAccounts>,
}

impl RoleLicenseType {
    pub const ID: &'static str = "role";

    pub fn new(users: Arc<dyn UserAccounts>) -> Self {
        Self { users }
    }

    fn role_of<'a>(&self, fields: &'a LicenseFields) -> Result<&'a str, LicenseError> {
        fields
            .text(ROLE_FIELD)
            .filter(|role| !role.trim().is_empty())
            .ok_or_else(|| LicenseError::validation(ROLE_FIELD, "is required"))
    }
}

#[async_trait]
impl LicenseTypeStrategy for RoleLicenseType {
    fn descriptor(&self) -> LicenseTypeDescriptor {
        LicenseTypeDescriptor::new(Self::ID, "Role")
            .with_existing_rights()
            .with_owner_lock()
    }

    fn field_schema(&self) -> FieldSchema {
        FieldSchema::new().required(ROLE_FIELD, FieldKind::Text)
    }

    fn label(&self, license: &License) -> String {
        match license.fields().text(ROLE_FIELD) {
            Some(role) => format!("{} role", role),
            None => "Role license".to_string(),
        }
    }

    async fn grant_license(&self, license: &License) -> Result<(), LicenseError> {
        let role = self.role_of(license.fields())?;
        self.users
            .grant_role(license.owner(), role)
            .await
            .map_err(|e| LicenseError::strategy_execution(Self::ID, "grant", e.to_string()))?;

        tracing::info!(license_id = %license.id(), owner = %license.owner(), role, "Granted role");
        Ok(())
    }

    async fn revoke_license(&self, license: &License) -> Result<(), LicenseError> {
        let role = self.role_of(license.fields())?;
        self.users
            .revoke_role(license.owner(), role)
            .await
            .map_err(|e| LicenseError::strategy_execution(Self::ID, "revoke", e.to_string()))?;

        tracing::info!(license_id = %license.id(), owner = %license.owner(), role, "Revoked role");
        Ok(())
    }

    async fn existing_rights(
        &self,
        owner: &UserId,
        settings: &LicenseFields,
    ) -> Result<ExistingRights, LicenseError> {
        let role = self.role_of(settings)?;
        let held = self
            .users
            .has_role(owner, role)
            .await
            .map_err(|e| LicenseError::strategy_execution(Self::ID, "check existing rights", e.to_string()))?;

        if held {
            Ok(ExistingRights::Held {
                message: format!("You already have the {} role.", role),
            })
        } else {
            Ok(ExistingRights::None)
        }
    }
}

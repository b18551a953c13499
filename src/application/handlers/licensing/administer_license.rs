//! AdministerLicenseHandler - manual license administration.
//!
//! Administrators create licenses (optionally straight into `active`,
//! optionally back-dated), apply transitions by name, correct fields while a
//! license is still `new`, correct the owner unless the kind locks it, and
//! delete licenses.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, LicenseId, OfferingId, Timestamp, UserId};
use crate::domain::licensing::{
    ExpirationPolicyRef, License, LicenseError, LicenseFields, LicenseTypeDescriptor,
    LicenseTypeRegistry, SideEffect, TransitionOutcome,
};

use super::LicenseLifecycle;

/// Command to create a license by hand.
#[derive(Debug, Clone)]
pub struct CreateLicenseCommand {
    pub kind: String,
    pub owner: UserId,
    pub offering: OfferingId,
    pub expiration: ExpirationPolicyRef,
    pub fields: LicenseFields,
    /// Create directly in `active`, granting immediately.
    pub activate: bool,
    /// Back-dates the grant of an active license.
    pub granted_at: Option<Timestamp>,
}

/// Command to apply a named transition.
#[derive(Debug, Clone)]
pub struct TransitionLicenseCommand {
    pub license_id: LicenseId,
    pub transition: String,
}

#[derive(Debug, Clone)]
pub struct UpdateLicenseFieldsCommand {
    pub license_id: LicenseId,
    pub fields: LicenseFields,
}

#[derive(Debug, Clone)]
pub struct ChangeLicenseOwnerCommand {
    pub license_id: LicenseId,
    pub owner: UserId,
}

/// A license with its display label and kind metadata.
#[derive(Debug, Clone)]
pub struct LicenseView {
    pub license: License,
    pub label: String,
    pub descriptor: LicenseTypeDescriptor,
}

/// Handler for administrative license commands.
pub struct AdministerLicenseHandler {
    lifecycle: LicenseLifecycle,
}

impl AdministerLicenseHandler {
    pub fn new(lifecycle: LicenseLifecycle) -> Self {
        Self { lifecycle }
    }

    fn registry(&self) -> &Arc<LicenseTypeRegistry> {
        &self.lifecycle.context().registry
    }

    pub async fn create(
        &self,
        cmd: CreateLicenseCommand,
        metadata: CommandMetadata,
    ) -> Result<License, LicenseError> {
        if cmd.granted_at.is_some() && !cmd.activate {
            return Err(LicenseError::validation(
                "granted_at",
                "can only be set when creating an active license",
            ));
        }

        self.registry()
            .get(&cmd.kind)?
            .field_schema()
            .validate(&cmd.fields)?;

        let license = License::new(
            cmd.kind,
            cmd.owner,
            cmd.offering,
            cmd.expiration,
            cmd.fields,
            self.lifecycle.context().clock.now(),
        );

        if cmd.activate {
            self.lifecycle
                .create_active(license, cmd.granted_at, &metadata)
                .await
        } else {
            self.lifecycle.create(license, &metadata).await
        }
    }

    pub async fn transition(
        &self,
        cmd: TransitionLicenseCommand,
        metadata: CommandMetadata,
    ) -> Result<(License, TransitionOutcome), LicenseError> {
        self.lifecycle
            .transition_by_id(&cmd.license_id, &cmd.transition, &metadata)
            .await
    }

    pub async fn update_fields(&self, cmd: UpdateLicenseFieldsCommand) -> Result<License, LicenseError> {
        let mut license = self.lifecycle.load(&cmd.license_id).await?;
        let now = self.lifecycle.context().clock.now();
        license.set_fields(cmd.fields, self.registry(), now)?;
        self.lifecycle.update(&license).await?;
        tracing::info!(license_id = %license.id(), "License fields updated");
        Ok(license)
    }

    pub async fn change_owner(&self, cmd: ChangeLicenseOwnerCommand) -> Result<License, LicenseError> {
        let mut license = self.lifecycle.load(&cmd.license_id).await?;
        let now = self.lifecycle.context().clock.now();
        license.set_owner(cmd.owner, self.registry(), now)?;
        self.lifecycle.update(&license).await?;
        tracing::info!(license_id = %license.id(), owner = %license.owner(), "License owner changed");
        Ok(license)
    }

    pub async fn delete(
        &self,
        license_id: LicenseId,
        metadata: CommandMetadata,
    ) -> Result<SideEffect, LicenseError> {
        self.lifecycle.delete(&license_id, &metadata).await
    }

    pub async fn describe(&self, license_id: LicenseId) -> Result<LicenseView, LicenseError> {
        let license = self.lifecycle.load(&license_id).await?;
        let strategy = self.registry().get(license.kind())?;
        Ok(LicenseView {
            label: strategy.label(&license),
            descriptor: strategy.descriptor(),
            license,
        })
    }

    /// Licenses held by `owner`, oldest first.
    pub async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<License>, LicenseError> {
        Ok(self.lifecycle.repository().find_by_owner(owner).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryLicenseRepository;
    use crate::adapters::users::InMemoryUserAccounts;
    use crate::domain::foundation::FixedClock;
    use crate::domain::licensing::{
        LicenseContext, LicenseState, PeriodUnit, RecurringPeriod, RecurringPeriodPolicy,
        RoleLicenseType, ROLE_FIELD,
    };

    const NOW: i64 = 1_700_000_000;

    fn handler() -> (AdministerLicenseHandler, Arc<InMemoryUserAccounts>) {
        let users = Arc::new(InMemoryUserAccounts::new());
        let registry = LicenseTypeRegistry::new()
            .with(Arc::new(RoleLicenseType::new(users.clone())))
            .unwrap();
        let policy = RecurringPeriodPolicy::new()
            .with_period("monthly", RecurringPeriod::new(PeriodUnit::Month, 1));
        let ctx = LicenseContext::new(
            Arc::new(registry),
            Arc::new(policy),
            users.clone(),
            Arc::new(FixedClock::at(Timestamp::from_unix_secs(NOW).unwrap())),
        );
        let lifecycle = LicenseLifecycle::new(
            Arc::new(InMemoryLicenseRepository::new()),
            Arc::new(InMemoryEventBus::new()),
            ctx,
        );
        (AdministerLicenseHandler::new(lifecycle), users)
    }

    fn create_cmd(activate: bool) -> CreateLicenseCommand {
        CreateLicenseCommand {
            kind: RoleLicenseType::ID.to_string(),
            owner: UserId::new("alice").unwrap(),
            offering: OfferingId::new(),
            expiration: ExpirationPolicyRef::new("monthly"),
            fields: LicenseFields::new().with(ROLE_FIELD, "editor"),
            activate,
            granted_at: None,
        }
    }

    fn admin() -> CommandMetadata {
        CommandMetadata::for_admin(UserId::new("admin").unwrap())
    }

    #[tokio::test]
    async fn create_new_license_runs_no_hook() {
        let (handler, users) = handler();
        let license = handler.create(create_cmd(false), admin()).await.unwrap();

        assert_eq!(license.state(), LicenseState::New);
        assert!(users.roles_of(license.owner()).is_empty());
    }

    #[tokio::test]
    async fn create_active_back_dated_computes_expiry_from_grant() {
        let (handler, users) = handler();
        let granted = Timestamp::from_unix_secs(NOW - 86_400 * 10).unwrap();
        let cmd = CreateLicenseCommand {
            granted_at: Some(granted),
            ..create_cmd(true)
        };

        let license = handler.create(cmd, admin()).await.unwrap();

        assert_eq!(license.state(), LicenseState::Active);
        assert_eq!(license.granted(), Some(granted));
        assert!(license.expires().unwrap() > granted);
        assert_eq!(users.roles_of(license.owner()), vec!["editor".to_string()]);
    }

    #[tokio::test]
    async fn granted_at_requires_activation() {
        let (handler, _) = handler();
        let cmd = CreateLicenseCommand {
            granted_at: Some(Timestamp::from_unix_secs(NOW).unwrap()),
            ..create_cmd(false)
        };

        let err = handler.create(cmd, admin()).await.unwrap_err();
        assert!(matches!(err, LicenseError::Validation { .. }));
    }

    #[tokio::test]
    async fn create_rejects_fields_outside_schema() {
        let (handler, _) = handler();
        let cmd = CreateLicenseCommand {
            fields: LicenseFields::new(),
            ..create_cmd(false)
        };

        let err = handler.create(cmd, admin()).await.unwrap_err();
        assert!(matches!(err, LicenseError::Validation { .. }));
    }

    #[tokio::test]
    async fn named_transition_drives_state() {
        let (handler, _) = handler();
        let license = handler.create(create_cmd(true), admin()).await.unwrap();

        let (license, outcome) = handler
            .transition(
                TransitionLicenseCommand {
                    license_id: license.id(),
                    transition: "suspend".to_string(),
                },
                admin(),
            )
            .await
            .unwrap();

        assert_eq!(license.state(), LicenseState::Suspended);
        assert_eq!(outcome.effect, SideEffect::Revoke);
    }

    #[tokio::test]
    async fn fields_editable_only_while_new() {
        let (handler, _) = handler();
        let fresh = handler.create(create_cmd(false), admin()).await.unwrap();
        let updated = handler
            .update_fields(UpdateLicenseFieldsCommand {
                license_id: fresh.id(),
                fields: LicenseFields::new().with(ROLE_FIELD, "author"),
            })
            .await
            .unwrap();
        assert_eq!(updated.fields().text(ROLE_FIELD), Some("author"));

        let active = handler.create(create_cmd(true), admin()).await.unwrap();
        let err = handler
            .update_fields(UpdateLicenseFieldsCommand {
                license_id: active.id(),
                fields: LicenseFields::new().with(ROLE_FIELD, "author"),
            })
            .await
            .unwrap_err();
        assert_eq!(err, LicenseError::FieldsLocked(active.id()));
    }

    #[tokio::test]
    async fn owner_locked_after_grant() {
        let (handler, _) = handler();
        let active = handler.create(create_cmd(true), admin()).await.unwrap();

        let err = handler
            .change_owner(ChangeLicenseOwnerCommand {
                license_id: active.id(),
                owner: UserId::new("bob").unwrap(),
            })
            .await
            .unwrap_err();

        assert_eq!(err, LicenseError::OwnerLocked(active.id()));
    }

    #[tokio::test]
    async fn owner_can_be_corrected_before_grant() {
        let (handler, _) = handler();
        let fresh = handler.create(create_cmd(false), admin()).await.unwrap();
        let bob = UserId::new("bob").unwrap();

        let license = handler
            .change_owner(ChangeLicenseOwnerCommand {
                license_id: fresh.id(),
                owner: bob.clone(),
            })
            .await
            .unwrap();

        assert_eq!(license.owner(), &bob);
        assert_eq!(handler.list_for_owner(&bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn describe_renders_label() {
        let (handler, _) = handler();
        let license = handler.create(create_cmd(false), admin()).await.unwrap();

        let view = handler.describe(license.id()).await.unwrap();

        assert_eq!(view.label, "editor role");
        assert_eq!(view.descriptor.id, RoleLicenseType::ID);
    }

    #[tokio::test]
    async fn delete_active_revokes() {
        let (handler, users) = handler();
        let license = handler.create(create_cmd(true), admin()).await.unwrap();

        let effect = handler.delete(license.id(), admin()).await.unwrap();

        assert_eq!(effect, SideEffect::Revoke);
        assert!(users.roles_of(license.owner()).is_empty());
        assert!(handler.describe(license.id()).await.is_err());
    }
}

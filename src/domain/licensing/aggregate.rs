//! License aggregate entity.
//!
//! A license grants one privilege to one owner, bought through one offering.
//! Its state only changes through [`License::apply_transition`] (or
//! [`License::into_active`] at construction), and every change that crosses
//! the `active` boundary runs exactly one grant or revoke hook.
//!
//! # Invariants
//!
//! - `kind` and `offering` never change after construction
//! - `granted` is set once, on the first entry into `active`
//! - `expires` is computed when `granted` is set; `None` means no expiry
//! - A failing hook leaves the license exactly as it was

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::foundation::{Clock, LicenseId, OfferingId, Timestamp, UserId};
use crate::ports::UserAccounts;

use super::{
    ExpirationPolicy, ExpirationPolicyRef, LicenseError, LicenseFields, LicenseState,
    LicenseTransition, LicenseTypeRegistry, SideEffect,
};

/// Collaborators a license needs to change state.
#[derive(Clone)]
pub struct LicenseContext {
    pub registry: Arc<LicenseTypeRegistry>,
    pub expiration: Arc<dyn ExpirationPolicy>,
    pub users: Arc<dyn UserAccounts>,
    pub clock: Arc<dyn Clock>,
    /// Offset used for owners without a known timezone.
    pub default_offset: FixedOffset,
}

impl LicenseContext {
    pub fn new(
        registry: Arc<LicenseTypeRegistry>,
        expiration: Arc<dyn ExpirationPolicy>,
        users: Arc<dyn UserAccounts>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            expiration,
            users,
            clock,
            default_offset: Utc.fix(),
        }
    }

    pub fn with_default_offset(mut self, offset: FixedOffset) -> Self {
        self.default_offset = offset;
        self
    }

    async fn owner_offset(&self, owner: &UserId) -> Result<FixedOffset, LicenseError> {
        Ok(self
            .users
            .timezone_of(owner)
            .await?
            .unwrap_or(self.default_offset))
    }
}

/// Result of a successfully applied transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub transition: LicenseTransition,
    pub from: LicenseState,
    pub to: LicenseState,
    pub effect: SideEffect,
}

impl TransitionOutcome {
    /// True when the transition left the state unchanged.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Persisted shape of a license, used by repositories to rebuild one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub id: LicenseId,
    pub kind: String,
    pub owner: UserId,
    pub offering: OfferingId,
    pub expiration: ExpirationPolicyRef,
    pub state: LicenseState,
    pub created: Timestamp,
    pub granted: Option<Timestamp>,
    pub expires: Option<Timestamp>,
    pub changed: Timestamp,
    pub fields: LicenseFields,
}

/// License aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    id: LicenseId,
    kind: String,
    owner: UserId,
    offering: OfferingId,
    expiration: ExpirationPolicyRef,
    state: LicenseState,
    created: Timestamp,
    granted: Option<Timestamp>,
    expires: Option<Timestamp>,
    changed: Timestamp,
    fields: LicenseFields,
}

impl License {
    /// Creates an unsaved license in state `new`. No hook runs.
    pub fn new(
        kind: impl Into<String>,
        owner: UserId,
        offering: OfferingId,
        expiration: ExpirationPolicyRef,
        fields: LicenseFields,
        now: Timestamp,
    ) -> Self {
        Self {
            id: LicenseId::new(),
            kind: kind.into(),
            owner,
            offering,
            expiration,
            state: LicenseState::New,
            created: now,
            granted: None,
            expires: None,
            changed: now,
            fields,
        }
    }

    /// Rebuilds a license from storage without running any hook.
    pub fn reconstitute(record: LicenseRecord) -> Self {
        Self {
            id: record.id,
            kind: record.kind,
            owner: record.owner,
            offering: record.offering,
            expiration: record.expiration,
            state: record.state,
            created: record.created,
            granted: record.granted,
            expires: record.expires,
            changed: record.changed,
            fields: record.fields,
        }
    }

    pub fn to_record(&self) -> LicenseRecord {
        LicenseRecord {
            id: self.id,
            kind: self.kind.clone(),
            owner: self.owner.clone(),
            offering: self.offering,
            expiration: self.expiration.clone(),
            state: self.state,
            created: self.created,
            granted: self.granted,
            expires: self.expires,
            changed: self.changed,
            fields: self.fields.clone(),
        }
    }

    // ════════════════════════════════════════════════════════════════════
    // Accessors
    // ════════════════════════════════════════════════════════════════════

    pub fn id(&self) -> LicenseId {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    pub fn offering(&self) -> OfferingId {
        self.offering
    }

    pub fn expiration(&self) -> &ExpirationPolicyRef {
        &self.expiration
    }

    pub fn state(&self) -> LicenseState {
        self.state
    }

    pub fn created(&self) -> Timestamp {
        self.created
    }

    pub fn granted(&self) -> Option<Timestamp> {
        self.granted
    }

    pub fn expires(&self) -> Option<Timestamp> {
        self.expires
    }

    pub fn changed(&self) -> Timestamp {
        self.changed
    }

    pub fn fields(&self) -> &LicenseFields {
        &self.fields
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    // ════════════════════════════════════════════════════════════════════
    // State changes
    // ════════════════════════════════════════════════════════════════════

    /// Creates the license directly in `active`, granting exactly once.
    ///
    /// `granted_at` back-dates the grant for administrative imports; the
    /// expiry is computed from it.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the license is not a fresh `new` record
    /// - Any error from the expiration policy or the grant hook
    pub async fn into_active(
        self,
        granted_at: Option<Timestamp>,
        ctx: &LicenseContext,
    ) -> Result<Self, LicenseError> {
        if self.state != LicenseState::New || self.granted.is_some() {
            return Err(LicenseError::invalid_transition(self.state, "create active"));
        }

        let mut next = self;
        next.enter(None, LicenseState::Active, granted_at, ctx).await?;
        Ok(next)
    }

    /// Applies a named transition and runs the side effect it owes.
    ///
    /// The new state is committed only after the hook succeeds.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if `transition` is not defined for the current state
    /// - `StrategyExecution` (or the hook's own error) if grant/revoke fails
    pub async fn apply_transition(
        &mut self,
        transition: LicenseTransition,
        ctx: &LicenseContext,
    ) -> Result<TransitionOutcome, LicenseError> {
        let from = self.state;
        let to = transition
            .target(from)
            .ok_or_else(|| LicenseError::invalid_transition(from, transition.as_str()))?;

        let mut next = self.clone();
        let effect = next.enter(Some(from), to, None, ctx).await?;
        *self = next;

        tracing::info!(
            license_id = %self.id,
            kind = %self.kind,
            %transition,
            %from,
            %to,
            ?effect,
            "Applied license transition"
        );

        Ok(TransitionOutcome {
            transition,
            from,
            to,
            effect,
        })
    }

    /// [`apply_transition`](Self::apply_transition) by transition name.
    pub async fn apply_transition_named(
        &mut self,
        name: &str,
        ctx: &LicenseContext,
    ) -> Result<TransitionOutcome, LicenseError> {
        let transition: LicenseTransition = name
            .parse()
            .map_err(|_| LicenseError::invalid_transition(self.state, name))?;
        self.apply_transition(transition, ctx).await
    }

    /// Runs the revoke hook owed before an active license is deleted.
    pub async fn revoke_for_deletion(&self, ctx: &LicenseContext) -> Result<SideEffect, LicenseError> {
        if !self.is_active() {
            return Ok(SideEffect::None);
        }
        ctx.registry.get(&self.kind)?.revoke_license(self).await?;
        tracing::info!(license_id = %self.id, kind = %self.kind, "Revoked license before deletion");
        Ok(SideEffect::Revoke)
    }

    /// Runs the hook opposite to `effect`, undoing a side effect whose
    /// state change could not be stored.
    pub async fn undo_side_effect(
        &self,
        effect: SideEffect,
        ctx: &LicenseContext,
    ) -> Result<(), LicenseError> {
        match effect {
            SideEffect::Grant => ctx.registry.get(&self.kind)?.revoke_license(self).await?,
            SideEffect::Revoke => ctx.registry.get(&self.kind)?.grant_license(self).await?,
            SideEffect::None => return Ok(()),
        }
        tracing::warn!(license_id = %self.id, kind = %self.kind, ?effect, "Undid license side effect");
        Ok(())
    }

    async fn enter(
        &mut self,
        previous: Option<LicenseState>,
        next: LicenseState,
        granted_at: Option<Timestamp>,
        ctx: &LicenseContext,
    ) -> Result<SideEffect, LicenseError> {
        let now = ctx.clock.now();
        let effect = SideEffect::between(previous, next);
        self.state = next;
        self.changed = now;

        match effect {
            SideEffect::Grant => {
                if self.granted.is_none() {
                    let granted = granted_at.unwrap_or(now);
                    let offset = ctx.owner_offset(&self.owner).await?;
                    let expiry = ctx
                        .expiration
                        .calculate_expiry(granted.in_offset(offset), &self.expiration)?;
                    self.granted = Some(granted);
                    self.expires = expiry.into_option();
                }
                ctx.registry.get(&self.kind)?.grant_license(self).await?;
            }
            SideEffect::Revoke => {
                ctx.registry.get(&self.kind)?.revoke_license(self).await?;
            }
            SideEffect::None => {}
        }

        Ok(effect)
    }

    // ════════════════════════════════════════════════════════════════════
    // Administrative edits
    // ════════════════════════════════════════════════════════════════════

    /// Corrects the owner.
    ///
    /// # Errors
    ///
    /// `OwnerLocked` if the kind locks the owner and the license was granted.
    pub fn set_owner(
        &mut self,
        owner: UserId,
        registry: &LicenseTypeRegistry,
        now: Timestamp,
    ) -> Result<(), LicenseError> {
        if self.granted.is_some() && registry.get(&self.kind)?.descriptor().locks_owner {
            return Err(LicenseError::OwnerLocked(self.id));
        }
        self.owner = owner;
        self.changed = now;
        Ok(())
    }

    /// Replaces the type-specific fields.
    ///
    /// # Errors
    ///
    /// - `FieldsLocked` unless the license is `new` and was never granted
    /// - `Validation` if the values do not match the kind's schema
    pub fn set_fields(
        &mut self,
        fields: LicenseFields,
        registry: &LicenseTypeRegistry,
        now: Timestamp,
    ) -> Result<(), LicenseError> {
        if self.state != LicenseState::New || self.granted.is_some() {
            return Err(LicenseError::FieldsLocked(self.id));
        }
        registry.get(&self.kind)?.field_schema().validate(&fields)?;
        self.fields = fields;
        self.changed = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::users::InMemoryUserAccounts;
    use crate::domain::foundation::FixedClock;
    use crate::domain::licensing::{
        Expiry, FieldKind, FieldSchema, LicenseTypeDescriptor, LicenseTypeStrategy, PeriodUnit,
        RecurringPeriod, RecurringPeriodPolicy,
    };
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    // ════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════

    #[derive(Default)]
    struct CountingStrategy {
        grants: AtomicUsize,
        revokes: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingStrategy {
        fn grants(&self) -> usize {
            self.grants.load(Ordering::SeqCst)
        }

        fn revokes(&self) -> usize {
            self.revokes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LicenseTypeStrategy for CountingStrategy {
        fn descriptor(&self) -> LicenseTypeDescriptor {
            LicenseTypeDescriptor::new("counting", "Counting").with_owner_lock()
        }

        fn field_schema(&self) -> FieldSchema {
            FieldSchema::new().optional("note", FieldKind::Text)
        }

        fn label(&self, _license: &License) -> String {
            "Counting".to_string()
        }

        async fn grant_license(&self, _license: &License) -> Result<(), LicenseError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(LicenseError::strategy_execution("counting", "grant", "offline"));
            }
            self.grants.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn revoke_license(&self, _license: &License) -> Result<(), LicenseError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(LicenseError::strategy_execution("counting", "revoke", "offline"));
            }
            self.revokes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    // ════════════════════════════════════════════════════════════════════
    // Helpers
    // ════════════════════════════════════════════════════════════════════

    fn at(rfc3339: &str) -> Timestamp {
        Timestamp::from_zoned(&DateTime::parse_from_rfc3339(rfc3339).unwrap())
    }

    struct Fixture {
        strategy: Arc<CountingStrategy>,
        users: Arc<InMemoryUserAccounts>,
        clock: Arc<FixedClock>,
        ctx: LicenseContext,
    }

    fn fixture() -> Fixture {
        let strategy = Arc::new(CountingStrategy::default());
        let registry = LicenseTypeRegistry::new().with(strategy.clone()).unwrap();
        let users = Arc::new(InMemoryUserAccounts::new());
        let clock = Arc::new(FixedClock::at(at("2024-01-31T22:30:00Z")));
        let policy = RecurringPeriodPolicy::new()
            .with_period("monthly", RecurringPeriod::new(PeriodUnit::Month, 1));
        let ctx = LicenseContext::new(
            Arc::new(registry),
            Arc::new(policy),
            users.clone(),
            clock.clone(),
        );
        Fixture {
            strategy,
            users,
            clock,
            ctx,
        }
    }

    fn new_license(expiration: &str) -> License {
        License::new(
            "counting",
            UserId::new("alice").unwrap(),
            OfferingId::new(),
            ExpirationPolicyRef::new(expiration),
            LicenseFields::new(),
            at("2024-01-01T00:00:00Z"),
        )
    }

    // ════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════

    #[test]
    fn new_license_starts_new_without_grant() {
        let license = new_license("monthly");
        assert_eq!(license.state(), LicenseState::New);
        assert_eq!(license.granted(), None);
        assert_eq!(license.expires(), None);
        assert_eq!(license.created(), license.changed());
    }

    #[tokio::test]
    async fn activate_then_confirm_grants_once() {
        let f = fixture();
        let mut license = new_license("monthly");

        let first = license.apply_transition(LicenseTransition::Activate, &f.ctx).await.unwrap();
        assert_eq!(first.effect, SideEffect::None);
        assert_eq!(f.strategy.grants(), 0);

        let second = license.apply_transition(LicenseTransition::Confirm, &f.ctx).await.unwrap();
        assert_eq!(second.effect, SideEffect::Grant);
        assert_eq!(f.strategy.grants(), 1);
        assert_eq!(license.state(), LicenseState::Active);
        assert_eq!(license.granted(), Some(f.clock.now()));
    }

    #[tokio::test]
    async fn expiry_uses_owner_timezone() {
        let f = fixture();
        f.users
            .set_timezone(&UserId::new("alice").unwrap(), FixedOffset::east_opt(2 * 3600).unwrap());
        let mut license = new_license("monthly");

        license.apply_transition(LicenseTransition::Activate, &f.ctx).await.unwrap();
        license.apply_transition(LicenseTransition::Confirm, &f.ctx).await.unwrap();

        // 22:30 UTC on 31 Jan is 00:30 on 1 Feb for the owner.
        assert_eq!(license.expires(), Some(at("2024-03-01T00:30:00+02:00")));
    }

    #[tokio::test]
    async fn expiry_falls_back_to_default_offset() {
        let f = fixture();
        let mut license = new_license("monthly");

        license.apply_transition(LicenseTransition::Activate, &f.ctx).await.unwrap();
        license.apply_transition(LicenseTransition::Confirm, &f.ctx).await.unwrap();

        assert_eq!(license.expires(), Some(at("2024-02-29T22:30:00Z")));
    }

    #[tokio::test]
    async fn unlimited_policy_leaves_no_expiry() {
        let f = fixture();
        let license = new_license("unlimited").into_active(None, &f.ctx).await.unwrap();

        assert!(license.granted().is_some());
        assert_eq!(license.expires(), None);
        assert_eq!(
            f.ctx
                .expiration
                .calculate_expiry(f.clock.now().in_offset(Utc.fix()), license.expiration())
                .unwrap(),
            Expiry::Unlimited
        );
    }

    #[tokio::test]
    async fn suspend_then_cancel_revokes_once() {
        let f = fixture();
        let mut license = new_license("monthly").into_active(None, &f.ctx).await.unwrap();

        license.apply_transition(LicenseTransition::Suspend, &f.ctx).await.unwrap();
        license.apply_transition(LicenseTransition::Cancel, &f.ctx).await.unwrap();

        assert_eq!(f.strategy.grants(), 1);
        assert_eq!(f.strategy.revokes(), 1);
        assert_eq!(license.state(), LicenseState::Canceled);
    }

    #[tokio::test]
    async fn cancel_twice_is_a_noop_save() {
        let f = fixture();
        let mut license = new_license("monthly").into_active(None, &f.ctx).await.unwrap();

        license.apply_transition(LicenseTransition::Cancel, &f.ctx).await.unwrap();
        let again = license.apply_transition(LicenseTransition::Cancel, &f.ctx).await.unwrap();

        assert!(again.is_noop());
        assert_eq!(again.effect, SideEffect::None);
        assert_eq!(f.strategy.revokes(), 1);
    }

    #[tokio::test]
    async fn construction_in_active_grants_once() {
        let f = fixture();
        let license = new_license("monthly").into_active(None, &f.ctx).await.unwrap();

        assert_eq!(license.state(), LicenseState::Active);
        assert_eq!(f.strategy.grants(), 1);
    }

    #[tokio::test]
    async fn back_dated_grant_drives_expiry() {
        let f = fixture();
        let license = new_license("monthly")
            .into_active(Some(at("2023-06-10T12:00:00Z")), &f.ctx)
            .await
            .unwrap();

        assert_eq!(license.granted(), Some(at("2023-06-10T12:00:00Z")));
        assert_eq!(license.expires(), Some(at("2023-07-10T12:00:00Z")));
    }

    #[tokio::test]
    async fn invalid_transition_leaves_license_untouched() {
        let f = fixture();
        let mut license = new_license("monthly");
        let before = license.clone();

        let err = license
            .apply_transition(LicenseTransition::Confirm, &f.ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, LicenseError::InvalidTransition { state: LicenseState::New, .. }));
        assert_eq!(license, before);
    }

    #[tokio::test]
    async fn unknown_transition_name_is_invalid() {
        let f = fixture();
        let mut license = new_license("monthly");

        let err = license.apply_transition_named("renew", &f.ctx).await.unwrap_err();
        assert!(matches!(err, LicenseError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn failing_grant_does_not_commit() {
        let f = fixture();
        let mut license = new_license("monthly");
        license.apply_transition(LicenseTransition::Activate, &f.ctx).await.unwrap();
        let before = license.clone();

        f.strategy.fail.store(true, Ordering::SeqCst);
        let err = license
            .apply_transition(LicenseTransition::Confirm, &f.ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, LicenseError::StrategyExecution { .. }));
        assert_eq!(license, before);
        assert_eq!(license.granted(), None);
    }

    #[tokio::test]
    async fn unregistered_kind_fails_on_grant() {
        let f = fixture();
        let mut license = License::new(
            "ghost",
            UserId::new("alice").unwrap(),
            OfferingId::new(),
            ExpirationPolicyRef::unlimited(),
            LicenseFields::new(),
            Timestamp::now(),
        );
        license.apply_transition(LicenseTransition::Activate, &f.ctx).await.unwrap();

        let err = license
            .apply_transition(LicenseTransition::Confirm, &f.ctx)
            .await
            .unwrap_err();
        assert_eq!(err, LicenseError::unknown_kind("ghost"));
        assert_eq!(license.state(), LicenseState::Pending);
    }

    #[tokio::test]
    async fn deletion_revokes_only_active_licenses() {
        let f = fixture();
        let active = new_license("monthly").into_active(None, &f.ctx).await.unwrap();
        let fresh = new_license("monthly");

        assert_eq!(fresh.revoke_for_deletion(&f.ctx).await.unwrap(), SideEffect::None);
        assert_eq!(f.strategy.revokes(), 0);

        assert_eq!(active.revoke_for_deletion(&f.ctx).await.unwrap(), SideEffect::Revoke);
        assert_eq!(f.strategy.revokes(), 1);
    }

    #[tokio::test]
    async fn undo_side_effect_runs_the_opposite_hook() {
        let f = fixture();
        let license = new_license("monthly");

        license.undo_side_effect(SideEffect::Grant, &f.ctx).await.unwrap();
        assert_eq!((f.strategy.grants(), f.strategy.revokes()), (0, 1));

        license.undo_side_effect(SideEffect::Revoke, &f.ctx).await.unwrap();
        assert_eq!((f.strategy.grants(), f.strategy.revokes()), (1, 1));

        license.undo_side_effect(SideEffect::None, &f.ctx).await.unwrap();
        assert_eq!((f.strategy.grants(), f.strategy.revokes()), (1, 1));
    }

    #[tokio::test]
    async fn owner_is_locked_after_grant() {
        let f = fixture();
        let mut fresh = new_license("monthly");
        let bob = UserId::new("bob").unwrap();

        fresh.set_owner(bob.clone(), &f.ctx.registry, Timestamp::now()).unwrap();
        assert_eq!(fresh.owner(), &bob);

        let mut active = new_license("monthly").into_active(None, &f.ctx).await.unwrap();
        let err = active.set_owner(bob, &f.ctx.registry, Timestamp::now()).unwrap_err();
        assert_eq!(err, LicenseError::OwnerLocked(active.id()));
    }

    #[tokio::test]
    async fn fields_are_editable_only_while_new() {
        let f = fixture();
        let mut license = new_license("monthly");
        let fields = LicenseFields::new().with("note", "vip");

        license.set_fields(fields.clone(), &f.ctx.registry, Timestamp::now()).unwrap();
        assert_eq!(license.fields(), &fields);

        let bad = LicenseFields::new().with("colour", "red");
        assert!(matches!(
            license.set_fields(bad, &f.ctx.registry, Timestamp::now()),
            Err(LicenseError::Validation { .. })
        ));

        license.apply_transition(LicenseTransition::Activate, &f.ctx).await.unwrap();
        let err = license
            .set_fields(LicenseFields::new(), &f.ctx.registry, Timestamp::now())
            .unwrap_err();
        assert_eq!(err, LicenseError::FieldsLocked(license.id()));
    }

    #[test]
    fn record_round_trip_preserves_everything() {
        let license = new_license("monthly");
        assert_eq!(License::reconstitute(license.to_record()), license);
    }
}

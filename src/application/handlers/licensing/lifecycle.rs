//! LicenseLifecycle - load, change, persist and publish in one place.
//!
//! Both the order-sync coordinator and the administrative handler drive
//! licenses through this service so every persisted change is followed by
//! the matching license events.

use std::sync::Arc;

use crate::domain::foundation::{
    CommandMetadata, EventEnvelope, EventId, LicenseId, SerializableDomainEvent, Timestamp,
};
use crate::domain::licensing::{
    License, LicenseContext, LicenseError, LicenseEvent, LicenseTransition, SideEffect,
    TransitionOutcome,
};
use crate::ports::{EventPublisher, LicenseRepository};

/// Persists license changes and publishes the events they produce.
#[derive(Clone)]
pub struct LicenseLifecycle {
    repository: Arc<dyn LicenseRepository>,
    publisher: Arc<dyn EventPublisher>,
    ctx: LicenseContext,
}

impl LicenseLifecycle {
    pub fn new(
        repository: Arc<dyn LicenseRepository>,
        publisher: Arc<dyn EventPublisher>,
        ctx: LicenseContext,
    ) -> Self {
        Self {
            repository,
            publisher,
            ctx,
        }
    }

    pub fn context(&self) -> &LicenseContext {
        &self.ctx
    }

    pub fn repository(&self) -> &Arc<dyn LicenseRepository> {
        &self.repository
    }

    /// Loads a license or fails with `NotFound`.
    pub async fn load(&self, id: &LicenseId) -> Result<License, LicenseError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| LicenseError::not_found("license", id))
    }

    /// Persists a freshly built license as is.
    pub async fn create(
        &self,
        license: License,
        metadata: &CommandMetadata,
    ) -> Result<License, LicenseError> {
        self.repository.save(&license).await?;
        tracing::info!(
            license_id = %license.id(),
            kind = %license.kind(),
            owner = %license.owner(),
            state = %license.state(),
            "License created"
        );

        self.publish(vec![self.created(&license)], metadata).await?;
        Ok(license)
    }

    /// Persists a license created directly in `active`, granting once.
    ///
    /// `granted_at` back-dates the grant.
    pub async fn create_active(
        &self,
        license: License,
        granted_at: Option<Timestamp>,
        metadata: &CommandMetadata,
    ) -> Result<License, LicenseError> {
        let license = license.into_active(granted_at, &self.ctx).await?;
        self.repository.save(&license).await?;
        tracing::info!(
            license_id = %license.id(),
            kind = %license.kind(),
            owner = %license.owner(),
            "License created active"
        );

        let events = vec![self.created(&license), self.granted(&license)];
        self.publish(events, metadata).await?;
        Ok(license)
    }

    /// Applies `transition`, persists the result and publishes.
    ///
    /// On failure `license` is left as it was before the call. A grant or
    /// revoke whose state change could not be stored is undone.
    pub async fn transition(
        &self,
        license: &mut License,
        transition: LicenseTransition,
        metadata: &CommandMetadata,
    ) -> Result<TransitionOutcome, LicenseError> {
        let mut next = license.clone();
        let outcome = next.apply_transition(transition, &self.ctx).await?;
        self.store_transition(&next, outcome).await?;
        *license = next;
        self.publish_transition(license, outcome, metadata).await?;
        Ok(outcome)
    }

    /// Loads a license and applies a transition given by name.
    pub async fn transition_by_id(
        &self,
        id: &LicenseId,
        transition: &str,
        metadata: &CommandMetadata,
    ) -> Result<(License, TransitionOutcome), LicenseError> {
        let mut license = self.load(id).await?;
        let outcome = license.apply_transition_named(transition, &self.ctx).await?;
        self.store_transition(&license, outcome).await?;
        self.publish_transition(&license, outcome, metadata).await?;
        Ok((license, outcome))
    }

    /// Saves administrative edits that do not change state.
    pub async fn update(&self, license: &License) -> Result<(), LicenseError> {
        self.repository.update(license).await?;
        Ok(())
    }

    /// Deletes a license, revoking first when it is active.
    pub async fn delete(
        &self,
        id: &LicenseId,
        metadata: &CommandMetadata,
    ) -> Result<SideEffect, LicenseError> {
        let license = self.load(id).await?;
        let effect = license.revoke_for_deletion(&self.ctx).await?;
        if let Err(err) = self.repository.delete(id).await {
            tracing::error!(license_id = %id, error = %err, "License not deleted");
            self.undo(&license, effect).await;
            return Err(err.into());
        }
        tracing::info!(license_id = %id, ?effect, "License deleted");

        let mut events = Vec::new();
        if effect == SideEffect::Revoke {
            events.push(self.revoked(&license));
        }
        events.push(LicenseEvent::Deleted {
            event_id: EventId::new(),
            license_id: *id,
            occurred_at: self.ctx.clock.now(),
        });
        self.publish(events, metadata).await?;
        Ok(effect)
    }

    async fn store_transition(
        &self,
        license: &License,
        outcome: TransitionOutcome,
    ) -> Result<(), LicenseError> {
        if let Err(err) = self.repository.update(license).await {
            tracing::error!(
                license_id = %license.id(),
                transition = %outcome.transition,
                error = %err,
                "Transition applied but not persisted"
            );
            self.undo(license, outcome.effect).await;
            return Err(err.into());
        }
        Ok(())
    }

    /// Best effort: the storage error is what the caller gets.
    async fn undo(&self, license: &License, effect: SideEffect) {
        if let Err(err) = license.undo_side_effect(effect, &self.ctx).await {
            tracing::error!(
                license_id = %license.id(),
                ?effect,
                error = %err,
                "Failed to undo license side effect"
            );
        }
    }

    async fn publish_transition(
        &self,
        license: &License,
        outcome: TransitionOutcome,
        metadata: &CommandMetadata,
    ) -> Result<(), LicenseError> {
        let mut events = Vec::new();
        if !outcome.is_noop() {
            events.push(LicenseEvent::StateChanged {
                event_id: EventId::new(),
                license_id: license.id(),
                transition: outcome.transition,
                from: outcome.from,
                to: outcome.to,
                occurred_at: self.ctx.clock.now(),
            });
        }
        match outcome.effect {
            SideEffect::Grant => events.push(self.granted(license)),
            SideEffect::Revoke => events.push(self.revoked(license)),
            SideEffect::None => {}
        }
        self.publish(events, metadata).await
    }

    async fn publish(
        &self,
        events: Vec<LicenseEvent>,
        metadata: &CommandMetadata,
    ) -> Result<(), LicenseError> {
        if events.is_empty() {
            return Ok(());
        }

        let envelopes = events
            .iter()
            .map(|event| event.to_envelope().map(|e| stamp(e, metadata)))
            .collect::<Result<Vec<_>, _>>()?;
        self.publisher.publish_all(envelopes).await?;
        Ok(())
    }

    fn created(&self, license: &License) -> LicenseEvent {
        LicenseEvent::Created {
            event_id: EventId::new(),
            license_id: license.id(),
            kind: license.kind().to_string(),
            owner: license.owner().clone(),
            state: license.state(),
            occurred_at: self.ctx.clock.now(),
        }
    }

    fn granted(&self, license: &License) -> LicenseEvent {
        let now = self.ctx.clock.now();
        LicenseEvent::Granted {
            event_id: EventId::new(),
            license_id: license.id(),
            owner: license.owner().clone(),
            granted_at: license.granted().unwrap_or(now),
            expires_at: license.expires(),
            occurred_at: now,
        }
    }

    fn revoked(&self, license: &License) -> LicenseEvent {
        LicenseEvent::Revoked {
            event_id: EventId::new(),
            license_id: license.id(),
            owner: license.owner().clone(),
            occurred_at: self.ctx.clock.now(),
        }
    }
}

fn stamp(envelope: EventEnvelope, metadata: &CommandMetadata) -> EventEnvelope {
    let envelope = envelope.with_correlation_id(metadata.correlation_id());
    match metadata.actor() {
        Some(actor) => envelope.with_user_id(actor.to_string()),
        None => envelope,
    }
}

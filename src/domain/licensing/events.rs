//! License domain events.
//!
//! Published after each successful persist so other parts of the system
//! (subscription creation, audit) can react to license changes.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainEvent, EventId, LicenseId, Timestamp, UserId};

use super::{LicenseState, LicenseTransition};

/// Events that occur during the license lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseEvent {
    /// A license record was persisted for the first time.
    Created {
        event_id: EventId,
        license_id: LicenseId,
        kind: String,
        owner: UserId,
        state: LicenseState,
        occurred_at: Timestamp,
    },

    /// A transition was applied and persisted.
    StateChanged {
        event_id: EventId,
        license_id: LicenseId,
        transition: LicenseTransition,
        from: LicenseState,
        to: LicenseState,
        occurred_at: Timestamp,
    },

    /// The privilege was granted to the owner.
    Granted {
        event_id: EventId,
        license_id: LicenseId,
        owner: UserId,
        granted_at: Timestamp,
        expires_at: Option<Timestamp>,
        occurred_at: Timestamp,
    },

    /// The privilege was withdrawn from the owner.
    Revoked {
        event_id: EventId,
        license_id: LicenseId,
        owner: UserId,
        occurred_at: Timestamp,
    },

    /// The record was removed.
    Deleted {
        event_id: EventId,
        license_id: LicenseId,
        occurred_at: Timestamp,
    },
}

impl LicenseEvent {
    pub fn license_id(&self) -> LicenseId {
        match self {
            LicenseEvent::Created { license_id, .. }
            | LicenseEvent::StateChanged { license_id, .. }
            | LicenseEvent::Granted { license_id, .. }
            | LicenseEvent::Revoked { license_id, .. }
            | LicenseEvent::Deleted { license_id, .. } => *license_id,
        }
    }
}

impl DomainEvent for LicenseEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LicenseEvent::Created { .. } => "license.created.v1",
            LicenseEvent::StateChanged { .. } => "license.state_changed.v1",
            LicenseEvent::Granted { .. } => "license.granted.v1",
            LicenseEvent::Revoked { .. } => "license.revoked.v1",
            LicenseEvent::Deleted { .. } => "license.deleted.v1",
        }
    }

    fn aggregate_id(&self) -> String {
        self.license_id().to_string()
    }

    fn aggregate_type(&self) -> &'static str {
        "License"
    }

    fn occurred_at(&self) -> Timestamp {
        match self {
            LicenseEvent::Created { occurred_at, .. }
            | LicenseEvent::StateChanged { occurred_at, .. }
            | LicenseEvent::Granted { occurred_at, .. }
            | LicenseEvent::Revoked { occurred_at, .. }
            | LicenseEvent::Deleted { occurred_at, .. } => *occurred_at,
        }
    }

    fn event_id(&self) -> EventId {
        match self {
            LicenseEvent::Created { event_id, .. }
            | LicenseEvent::StateChanged { event_id, .. }
            | LicenseEvent::Granted { event_id, .. }
            | LicenseEvent::Revoked { event_id, .. }
            | LicenseEvent::Deleted { event_id, .. } => event_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SerializableDomainEvent;

    #[test]
    fn envelope_routes_by_event_type() {
        let license_id = LicenseId::new();
        let event = LicenseEvent::Granted {
            event_id: EventId::new(),
            license_id,
            owner: UserId::new("alice").unwrap(),
            granted_at: Timestamp::now(),
            expires_at: None,
            occurred_at: Timestamp::now(),
        };

        let envelope = event.to_envelope().unwrap();

        assert_eq!(envelope.event_type, "license.granted.v1");
        assert_eq!(envelope.aggregate_type, "License");
        assert_eq!(envelope.aggregate_id, license_id.to_string());
        assert_eq!(envelope.payload_as::<LicenseEvent>().unwrap(), event);
    }
}

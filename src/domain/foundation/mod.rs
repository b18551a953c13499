//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, the state machine contract, the
//! clock abstraction, event envelopes and error types that form the
//! vocabulary of the licensing domain.

mod clock;
mod command;
mod errors;
mod events;
mod ids;
mod state_machine;
mod timestamp;

pub use clock::{Clock, FixedClock, SystemClock};
pub use command::CommandMetadata;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent};
pub use ids::{LicenseId, OfferingId, OrderId, OrderLineId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;

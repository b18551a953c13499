//! Order event subscriber port.
//!
//! Subscribers react to order-workflow and cart notifications. They are
//! dispatched in ascending `priority` order; a subscriber that needs the
//! output of another lists it in `depends_on`, and registration fails
//! unless that producer is already ordered before it.

use async_trait::async_trait;

use crate::domain::licensing::LicenseError;
use crate::domain::ordering::{OrderEvent, OrderEventKind};

#[async_trait]
pub trait OrderEventSubscriber: Send + Sync {
    /// Unique name, referenced by other subscribers' `depends_on`.
    fn name(&self) -> &'static str;

    /// Lower runs first.
    fn priority(&self) -> i32;

    /// Event kinds this subscriber wants.
    fn interests(&self) -> &'static [OrderEventKind];

    /// Subscribers that must run before this one.
    fn depends_on(&self) -> &'static [&'static str] {
        &[]
    }

    /// Reacts to an event. Errors are propagated to the order workflow.
    async fn handle(&self, event: &OrderEvent) -> Result<(), LicenseError>;
}

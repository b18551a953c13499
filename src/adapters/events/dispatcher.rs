//! Order event dispatcher - delivers order notifications to subscribers in
//! priority order.
//!
//! Subscribers are kept in one list sorted by priority (lower first, ties
//! in registration order). A subscriber's `depends_on` producers must
//! already be ordered before it, otherwise registration fails; the order
//! is therefore fixed when the dispatcher is built, not at delivery time.
//!
//! Delivery stops at the first failing subscriber and returns its error.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::licensing::LicenseError;
use crate::domain::ordering::OrderEvent;
use crate::ports::OrderEventSubscriber;

/// Ordered list of order event subscribers.
#[derive(Default)]
pub struct OrderEventDispatcher {
    subscribers: Vec<Arc<dyn OrderEventSubscriber>>,
}

impl OrderEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a subscriber at its priority position.
    ///
    /// # Errors
    ///
    /// `Validation` when the name is taken or a dependency is missing or
    /// would run later.
    pub fn register(&mut self, subscriber: Arc<dyn OrderEventSubscriber>) -> Result<(), LicenseError> {
        let name = subscriber.name();
        let priority = subscriber.priority();

        if self.subscribers.iter().any(|s| s.name() == name) {
            return Err(LicenseError::validation(
                "subscriber",
                format!("'{}' is already registered", name),
            ));
        }

        // Stable: after every subscriber with priority <= ours.
        let position = self
            .subscribers
            .iter()
            .position(|s| s.priority() > priority)
            .unwrap_or(self.subscribers.len());

        let before = &self.subscribers[..position];

        for dependency in subscriber.depends_on() {
            if !before.iter().any(|s| s.name() == *dependency) {
                return Err(LicenseError::validation(
                    "subscriber",
                    format!("'{}' depends on '{}', which is not ordered before it", name, dependency),
                ));
            }
        }

        info!(subscriber = name, priority, position, "Order event subscriber registered");
        self.subscribers.insert(position, subscriber);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, subscriber: Arc<dyn OrderEventSubscriber>) -> Result<Self, LicenseError> {
        self.register(subscriber)?;
        Ok(self)
    }

    /// Subscriber names in delivery order.
    pub fn order(&self) -> Vec<&'static str> {
        self.subscribers.iter().map(|s| s.name()).collect()
    }

    /// Delivers `event` to every interested subscriber in order.
    ///
    /// # Errors
    ///
    /// The first subscriber error, unchanged. Later subscribers do not run.
    pub async fn dispatch(&self, event: &OrderEvent) -> Result<(), LicenseError> {
        let kind = event.kind();
        debug!(
            event_type = event.event_type(),
            order_id = %event.order_id(),
            "Dispatching order event"
        );

        for subscriber in self
            .subscribers
            .iter()
            .filter(|s| s.interests().contains(&kind))
        {
            if let Err(err) = subscriber.handle(event).await {
                warn!(
                    subscriber = subscriber.name(),
                    event_type = event.event_type(),
                    order_id = %event.order_id(),
                    error = %err,
                    "Order event subscriber failed"
                );
                return Err(err);
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for OrderEventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderEventDispatcher")
            .field("order", &self.order())
            .finish()
    }
}

//! Notifications emitted by the order workflow and the cart.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{OrderId, OrderLineId};

/// An order-side notification licensing reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    /// The order workflow changed state. May be delivered more than once.
    Transitioned {
        order: OrderId,
        from_state: String,
        to_state: String,
    },

    /// The order reached its terminal canceled state.
    Canceled { order: OrderId },

    /// A line was added to the order.
    LineAdded { order: OrderId, line: OrderLineId },

    /// An existing line's quantity changed.
    LineQuantityChanged {
        order: OrderId,
        line: OrderLineId,
        previous: u32,
        quantity: u32,
    },
}

/// Discriminant used by subscribers to declare interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderEventKind {
    Transitioned,
    Canceled,
    LineAdded,
    LineQuantityChanged,
}

impl OrderEvent {
    pub fn kind(&self) -> OrderEventKind {
        match self {
            OrderEvent::Transitioned { .. } => OrderEventKind::Transitioned,
            OrderEvent::Canceled { .. } => OrderEventKind::Canceled,
            OrderEvent::LineAdded { .. } => OrderEventKind::LineAdded,
            OrderEvent::LineQuantityChanged { .. } => OrderEventKind::LineQuantityChanged,
        }
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::Transitioned { order, .. }
            | OrderEvent::Canceled { order }
            | OrderEvent::LineAdded { order, .. }
            | OrderEvent::LineQuantityChanged { order, .. } => *order,
        }
    }

    /// Returns the event type string for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Transitioned { .. } => "order.transitioned",
            OrderEvent::Canceled { .. } => "order.canceled",
            OrderEvent::LineAdded { .. } => "order.line_added",
            OrderEvent::LineQuantityChanged { .. } => "order.line_quantity_changed",
        }
    }
}

//! Order and order line as seen by the licensing engine.
//!
//! The order workflow itself lives elsewhere; this module only models
//! what licensing reads (lines, their offerings and license references)
//! and the cart's add-item merge that feeds the quantity guard.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{LicenseId, OfferingId, OrderId, OrderLineId, UserId};

use super::OrderEvent;

/// One purchased item on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub offering: OfferingId,
    pub quantity: u32,
    pub license: Option<LicenseId>,
}

/// An order (or cart, while in its draft state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: UserId,
    /// Current workflow state id, owned by the order workflow.
    pub state: String,
    /// Lines in sequence order.
    pub lines: Vec<OrderLine>,
}

impl Order {
    pub fn new(customer: UserId, state: impl Into<String>) -> Self {
        Self {
            id: OrderId::new(),
            customer,
            state: state.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(&self, id: OrderLineId) -> Option<&OrderLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    pub fn line_mut(&mut self, id: OrderLineId) -> Option<&mut OrderLine> {
        self.lines.iter_mut().find(|line| line.id == id)
    }

    /// Adds `quantity` of an offering, merging into an existing line for
    /// the same offering the way a cart does.
    ///
    /// Returns the event the cart emits for the change.
    pub fn add_item(&mut self, offering: OfferingId, quantity: u32) -> OrderEvent {
        let order = self.id;
        if let Some(line) = self.lines.iter_mut().find(|line| line.offering == offering) {
            let previous = line.quantity;
            line.quantity = previous.saturating_add(quantity);
            return OrderEvent::LineQuantityChanged {
                order,
                line: line.id,
                previous,
                quantity: line.quantity,
            };
        }

        let line = OrderLine {
            id: OrderLineId::new(),
            offering,
            quantity,
            license: None,
        };
        let line_id = line.id;
        self.lines.push(line);
        OrderEvent::LineAdded {
            order,
            line: line_id,
        }
    }

    /// Moves the order to a new workflow state, returning the transition event.
    pub fn transition_to(&mut self, state: impl Into<String>) -> OrderEvent {
        let to_state = state.into();
        let from_state = std::mem::replace(&mut self.state, to_state.clone());
        OrderEvent::Transitioned {
            order: self.id,
            from_state,
            to_state,
        }
    }
}

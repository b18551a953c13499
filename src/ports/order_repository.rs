//! Order repository port.
//!
//! The order workflow owns orders; licensing reads them and writes back
//! only the license reference and quantity of individual lines.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, LicenseId, OrderId, OrderLineId};
use crate::domain::ordering::Order;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Find an order with its lines in sequence order.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError>;

    /// Store the whole order, replacing any previous version.
    async fn save(&self, order: &Order) -> Result<(), DomainError>;

    /// Record the license created for a line.
    ///
    /// # Errors
    ///
    /// - `OrderLineNotFound` if the line does not exist
    async fn attach_license(
        &self,
        order: &OrderId,
        line: &OrderLineId,
        license: &LicenseId,
    ) -> Result<(), DomainError>;

    /// Change a line's quantity.
    async fn set_quantity(
        &self,
        order: &OrderId,
        line: &OrderLineId,
        quantity: u32,
    ) -> Result<(), DomainError>;

    /// Remove a line from the order.
    async fn remove_line(&self, order: &OrderId, line: &OrderLineId) -> Result<(), DomainError>;
}

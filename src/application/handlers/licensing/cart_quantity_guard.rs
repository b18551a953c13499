//! CartQuantityGuard - a licensable line never holds more than one unit.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{OrderId, OrderLineId};
use crate::domain::licensing::LicenseError;
use crate::domain::ordering::{OrderEvent, OrderEventKind};
use crate::ports::{NoticeLevel, NoticeSink, OfferingCatalog, OrderEventSubscriber, OrderRepository};

/// Forces the quantity of licensable lines back to 1 and tells the customer.
pub struct CartQuantityGuard {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn OfferingCatalog>,
    notices: Arc<dyn NoticeSink>,
}

impl CartQuantityGuard {
    pub const NAME: &'static str = "license_cart_quantity";
    pub const PRIORITY: i32 = -50;

    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn OfferingCatalog>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            orders,
            catalog,
            notices,
        }
    }

    /// Returns `true` when the line was corrected.
    pub async fn check_line(&self, order_id: OrderId, line_id: OrderLineId) -> Result<bool, LicenseError> {
        let order = self
            .orders
            .find_by_id(&order_id)
            .await?
            .ok_or_else(|| LicenseError::not_found("order", order_id))?;

        // An earlier subscriber may have removed the line.
        let Some(line) = order.line(line_id) else {
            tracing::debug!(order_id = %order_id, line_id = %line_id, "Order line gone, nothing to check");
            return Ok(false);
        };
        if line.quantity <= 1 {
            return Ok(false);
        }

        // Unknown offerings fail the order at placement, not here.
        let Some(offering) = self.catalog.find_by_id(&line.offering).await? else {
            tracing::warn!(
                order_id = %order_id,
                line_id = %line_id,
                offering_id = %line.offering,
                "Offering not in catalog, quantity left unchecked"
            );
            return Ok(false);
        };
        if !offering.is_licensable() {
            return Ok(false);
        }

        self.orders.set_quantity(&order_id, &line_id, 1).await?;
        self.notices
            .notify(
                &order.customer,
                NoticeLevel::Error,
                &format!("You may only have one of {} in your cart.", offering.title),
            )
            .await?;

        tracing::info!(
            order_id = %order_id,
            line_id = %line_id,
            previous = line.quantity,
            "Licensable line quantity reset to 1"
        );
        Ok(true)
    }
}

#[async_trait]
impl OrderEventSubscriber for CartQuantityGuard {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn interests(&self) -> &'static [OrderEventKind] {
        &[OrderEventKind::LineAdded, OrderEventKind::LineQuantityChanged]
    }

    async fn handle(&self, event: &OrderEvent) -> Result<(), LicenseError> {
        match event {
            OrderEvent::LineAdded { order, line }
            | OrderEvent::LineQuantityChanged { order, line, .. } => {
                self.check_line(*order, *line).await.map(|_| ())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryNoticeSink, InMemoryOfferingCatalog, InMemoryOrderRepository};
    use crate::domain::foundation::{OfferingId, UserId};
    use crate::domain::licensing::{ExpirationPolicyRef, LicenseFields, ROLE_FIELD};
    use crate::domain::ordering::{Offering, Order};

    struct Fixture {
        guard: CartQuantityGuard,
        orders: Arc<InMemoryOrderRepository>,
        catalog: Arc<InMemoryOfferingCatalog>,
        notices: Arc<InMemoryNoticeSink>,
    }

    fn fixture() -> Fixture {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let catalog = Arc::new(InMemoryOfferingCatalog::new());
        let notices = Arc::new(InMemoryNoticeSink::new());
        Fixture {
            guard: CartQuantityGuard::new(orders.clone(), catalog.clone(), notices.clone()),
            orders,
            catalog,
            notices,
        }
    }

    fn licensable() -> Offering {
        Offering::licensable(
            OfferingId::new(),
            "Editor access",
            "role",
            LicenseFields::new().with(ROLE_FIELD, "editor"),
            ExpirationPolicyRef::unlimited(),
        )
    }

    #[tokio::test]
    async fn merged_licensable_line_is_reset_to_one() {
        let f = fixture();
        let offering = licensable();
        f.catalog.insert(offering.clone()).await;
        let mut cart = Order::new(UserId::new("alice").unwrap(), "draft");
        cart.add_item(offering.id, 1);
        let event = cart.add_item(offering.id, 1);
        f.orders.save(&cart).await.unwrap();

        f.guard.handle(&event).await.unwrap();

        let stored = f.orders.find_by_id(&cart.id).await.unwrap().unwrap();
        assert_eq!(stored.lines.len(), 1);
        assert_eq!(stored.lines[0].quantity, 1);
        let notices = f.notices.notices().await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(notices[0].message.contains("Editor access"));
    }

    #[tokio::test]
    async fn plain_offering_quantity_is_left_alone() {
        let f = fixture();
        let offering = Offering::plain(OfferingId::new(), "T-shirt");
        f.catalog.insert(offering.clone()).await;
        let mut cart = Order::new(UserId::new("alice").unwrap(), "draft");
        let event = cart.add_item(offering.id, 3);
        f.orders.save(&cart).await.unwrap();

        f.guard.handle(&event).await.unwrap();

        let stored = f.orders.find_by_id(&cart.id).await.unwrap().unwrap();
        assert_eq!(stored.lines[0].quantity, 3);
        assert!(f.notices.notices().await.is_empty());
    }

    #[tokio::test]
    async fn removed_line_is_skipped() {
        let f = fixture();
        let cart = Order::new(UserId::new("alice").unwrap(), "draft");
        f.orders.save(&cart).await.unwrap();

        let corrected = f.guard.check_line(cart.id, OrderLineId::new()).await.unwrap();

        assert!(!corrected);
    }

    #[tokio::test]
    async fn unknown_offering_is_left_alone() {
        let f = fixture();
        let mut cart = Order::new(UserId::new("alice").unwrap(), "draft");
        let event = cart.add_item(OfferingId::new(), 2);
        f.orders.save(&cart).await.unwrap();

        f.guard.handle(&event).await.unwrap();

        let stored = f.orders.find_by_id(&cart.id).await.unwrap().unwrap();
        assert_eq!(stored.lines[0].quantity, 2);
        assert!(f.notices.notices().await.is_empty());
    }
}

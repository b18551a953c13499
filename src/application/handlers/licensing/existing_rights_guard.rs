//! ExistingRightsGuard - keeps customers from buying what they already hold.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{OrderId, OrderLineId};
use crate::domain::licensing::{ExistingRights, LicenseError, LicenseTypeRegistry};
use crate::domain::ordering::{OrderEvent, OrderEventKind};
use crate::ports::{NoticeLevel, NoticeSink, OfferingCatalog, OrderEventSubscriber, OrderRepository};

/// Removes a newly added line when its license kind reports that the
/// customer already holds the privilege.
///
/// Only kinds whose descriptor declares `existing_rights` are asked.
pub struct ExistingRightsGuard {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn OfferingCatalog>,
    registry: Arc<LicenseTypeRegistry>,
    notices: Arc<dyn NoticeSink>,
}

impl ExistingRightsGuard {
    pub const NAME: &'static str = "license_existing_rights";

    /// Ahead of the quantity guard, so a removed line is never corrected.
    pub const PRIORITY: i32 = -60;

    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn OfferingCatalog>,
        registry: Arc<LicenseTypeRegistry>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            orders,
            catalog,
            registry,
            notices,
        }
    }

    /// Returns `true` when the line was removed.
    pub async fn check_line(&self, order_id: OrderId, line_id: OrderLineId) -> Result<bool, LicenseError> {
        let order = self
            .orders
            .find_by_id(&order_id)
            .await?
            .ok_or_else(|| LicenseError::not_found("order", order_id))?;
        let Some(line) = order.line(line_id) else {
            return Ok(false);
        };
        // Unknown offerings fail the order at placement, not here.
        let Some(offering) = self.catalog.find_by_id(&line.offering).await? else {
            tracing::warn!(
                order_id = %order_id,
                line_id = %line_id,
                offering_id = %line.offering,
                "Offering not in catalog, existing rights left unchecked"
            );
            return Ok(false);
        };
        let Some(kind) = offering.license_kind.as_deref() else {
            return Ok(false);
        };

        let configured = self.registry.configure(kind, offering.license_settings.clone())?;
        if !configured.descriptor().existing_rights {
            return Ok(false);
        }

        let message = match configured
            .strategy()
            .existing_rights(&order.customer, configured.settings())
            .await?
        {
            ExistingRights::None => return Ok(false),
            ExistingRights::Held { message } => message,
        };

        self.orders.remove_line(&order_id, &line_id).await?;
        self.notices
            .notify(&order.customer, NoticeLevel::Error, &message)
            .await?;

        tracing::info!(
            order_id = %order_id,
            line_id = %line_id,
            kind,
            customer = %order.customer,
            "Removed order line for privilege already held"
        );
        Ok(true)
    }
}

#[async_trait]
impl OrderEventSubscriber for ExistingRightsGuard {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn interests(&self) -> &'static [OrderEventKind] {
        &[OrderEventKind::LineAdded]
    }

    async fn handle(&self, event: &OrderEvent) -> Result<(), LicenseError> {
        match event {
            OrderEvent::LineAdded { order, line } => self.check_line(*order, *line).await.map(|_| ()),
            _ => Ok(()),
        }
    }
}

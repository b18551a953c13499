//! OrderSyncCoordinator - keeps licenses in step with the order workflow.
//!
//! On a transition into the placed or fulfilled state every licensable line
//! gets a license (created once, attached to the line) and, when the
//! activation rule says so, is driven `new -> pending -> active`. On
//! cancellation every attached license is canceled.
//!
//! Notifications may arrive more than once. A line whose license is already
//! active is skipped, and re-canceling a canceled license changes nothing.
//!
//! Lines are processed in sequence order. A failing line does not stop its
//! siblings; all failures are returned together once every line was tried.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::OrderWorkflowConfig;
use crate::domain::foundation::{CommandMetadata, OrderId, OrderLineId};
use crate::domain::licensing::{License, LicenseError, LicenseFactory, LicenseState, LicenseTransition};
use crate::domain::ordering::{Offering, Order, OrderEvent, OrderEventKind, OrderLine};
use crate::ports::{OfferingCatalog, OrderEventSubscriber, OrderRepository};

use super::LicenseLifecycle;

/// Creates, activates and cancels licenses in response to order events.
pub struct OrderSyncCoordinator {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn OfferingCatalog>,
    factory: LicenseFactory,
    lifecycle: LicenseLifecycle,
    workflow: OrderWorkflowConfig,
}

impl OrderSyncCoordinator {
    pub const NAME: &'static str = "license_order_sync";

    /// Runs ahead of every subscriber that expects a license on the line.
    pub const PRIORITY: i32 = -100;

    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn OfferingCatalog>,
        factory: LicenseFactory,
        lifecycle: LicenseLifecycle,
        workflow: OrderWorkflowConfig,
    ) -> Self {
        Self {
            orders,
            catalog,
            factory,
            lifecycle,
            workflow,
        }
    }

    /// Reacts to an order workflow transition.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the order is gone
    /// - the single line's error, or `LinesFailed` when several lines failed
    pub async fn on_transition(
        &self,
        order_id: OrderId,
        from_state: &str,
        to_state: &str,
    ) -> Result<(), LicenseError> {
        if to_state == self.workflow.canceled_state {
            return self.on_cancel(order_id).await;
        }
        if to_state != self.workflow.placed_state && to_state != self.workflow.fulfilled_state {
            tracing::debug!(order_id = %order_id, to_state, "Order transition not relevant to licensing");
            return Ok(());
        }

        let order = self.load_order(order_id).await?;
        let metadata = CommandMetadata::for_order(order.id);
        let mut failures = Vec::new();

        for line in &order.lines {
            if let Err(err) = self
                .sync_line(&order, line, from_state, to_state, &metadata)
                .await
            {
                tracing::warn!(
                    order_id = %order.id,
                    line_id = %line.id,
                    error = %err,
                    "Failed to synchronize license for order line"
                );
                failures.push((line.id, err));
            }
        }

        finish(order.id, failures)
    }

    /// Cancels the license of every line that has one.
    pub async fn on_cancel(&self, order_id: OrderId) -> Result<(), LicenseError> {
        let order = self.load_order(order_id).await?;
        let metadata = CommandMetadata::for_order(order.id);
        let mut failures = Vec::new();

        for line in &order.lines {
            let Some(license_id) = line.license else {
                continue;
            };

            let result = async {
                let mut license = self.lifecycle.load(&license_id).await?;
                self.lifecycle
                    .transition(&mut license, LicenseTransition::Cancel, &metadata)
                    .await
            }
            .await;

            if let Err(err) = result {
                tracing::warn!(
                    order_id = %order.id,
                    line_id = %line.id,
                    license_id = %license_id,
                    error = %err,
                    "Failed to cancel license for order line"
                );
                failures.push((line.id, err));
            }
        }

        finish(order.id, failures)
    }

    async fn load_order(&self, order_id: OrderId) -> Result<Order, LicenseError> {
        self.orders
            .find_by_id(&order_id)
            .await?
            .ok_or_else(|| LicenseError::not_found("order", order_id))
    }

    async fn sync_line(
        &self,
        order: &Order,
        line: &OrderLine,
        from_state: &str,
        to_state: &str,
        metadata: &CommandMetadata,
    ) -> Result<(), LicenseError> {
        let offering = self
            .catalog
            .find_by_id(&line.offering)
            .await?
            .ok_or_else(|| LicenseError::not_found("offering", line.offering))?;
        if !offering.is_licensable() {
            return Ok(());
        }

        let mut license = match line.license {
            Some(license_id) => self.lifecycle.load(&license_id).await?,
            None => self.create_for_line(order, line, &offering, metadata).await?,
        };

        if license.is_active() {
            tracing::debug!(
                order_id = %order.id,
                license_id = %license.id(),
                "License already active, skipping"
            );
            return Ok(());
        }

        if !self.should_activate(&offering, from_state, to_state) {
            return Ok(());
        }

        self.activate(&mut license, metadata).await
    }

    async fn create_for_line(
        &self,
        order: &Order,
        line: &OrderLine,
        offering: &Offering,
        metadata: &CommandMetadata,
    ) -> Result<License, LicenseError> {
        let license = self
            .factory
            .create_from_purchase(offering, order.customer.clone())?;
        let license = self.lifecycle.create(license, metadata).await?;
        if let Err(err) = self
            .orders
            .attach_license(&order.id, &line.id, &license.id())
            .await
        {
            // Still `new`, so removing it runs no hook.
            if let Err(cleanup) = self.lifecycle.delete(&license.id(), metadata).await {
                tracing::error!(
                    order_id = %order.id,
                    line_id = %line.id,
                    license_id = %license.id(),
                    error = %cleanup,
                    "Failed to remove unattached license"
                );
            }
            return Err(err.into());
        }

        tracing::info!(
            order_id = %order.id,
            line_id = %line.id,
            license_id = %license.id(),
            "License attached to order line"
        );
        Ok(license)
    }

    fn should_activate(&self, offering: &Offering, from_state: &str, to_state: &str) -> bool {
        if to_state == self.workflow.fulfilled_state {
            return true;
        }
        if !offering.activate_on_place {
            return false;
        }
        if self.workflow.activate_on_place_requires_draft_origin {
            from_state == self.workflow.draft_state
        } else {
            to_state == self.workflow.placed_state
        }
    }

    async fn activate(
        &self,
        license: &mut License,
        metadata: &CommandMetadata,
    ) -> Result<(), LicenseError> {
        if license.state() == LicenseState::New {
            self.lifecycle
                .transition(license, LicenseTransition::Activate, metadata)
                .await?;
        }
        if license.state() == LicenseState::Pending {
            self.lifecycle
                .transition(license, LicenseTransition::Confirm, metadata)
                .await?;
            return Ok(());
        }

        tracing::info!(
            license_id = %license.id(),
            state = %license.state(),
            "License not activated from its current state"
        );
        Ok(())
    }
}

fn finish(order: OrderId, failures: Vec<(OrderLineId, LicenseError)>) -> Result<(), LicenseError> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(LicenseError::lines_failed(order, failures))
    }
}

#[async_trait]
impl OrderEventSubscriber for OrderSyncCoordinator {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn interests(&self) -> &'static [OrderEventKind] {
        &[OrderEventKind::Transitioned, OrderEventKind::Canceled]
    }

    async fn handle(&self, event: &OrderEvent) -> Result<(), LicenseError> {
        match event {
            OrderEvent::Transitioned {
                order,
                from_state,
                to_state,
            } => self.on_transition(*order, from_state, to_state).await,
            OrderEvent::Canceled { order } => self.on_cancel(*order).await,
            _ => Ok(()),
        }
    }
}

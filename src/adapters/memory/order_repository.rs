//! In-memory order repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, LicenseId, OrderId, OrderLineId};
use crate::domain::ordering::{Order, OrderLine};
use crate::ports::OrderRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    fail_attach: Arc<AtomicBool>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `attach_license` fail, to simulate a failed line write.
    pub fn fail_attach(&self, fail: bool) {
        self.fail_attach.store(fail, Ordering::SeqCst);
    }

    async fn with_line<F>(&self, order: &OrderId, line: &OrderLineId, f: F) -> Result<(), DomainError>
    where
        F: FnOnce(&mut Order, usize),
    {
        let mut orders = self.orders.write().await;
        let stored = orders.get_mut(order).ok_or_else(|| {
            DomainError::new(ErrorCode::OrderNotFound, format!("Order not found: {}", order))
        })?;
        let index = stored
            .lines
            .iter()
            .position(|l: &OrderLine| l.id == *line)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::OrderLineNotFound,
                    format!("Order line not found: {}", line),
                )
            })?;
        f(stored, index);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn save(&self, order: &Order) -> Result<(), DomainError> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn attach_license(
        &self,
        order: &OrderId,
        line: &OrderLineId,
        license: &LicenseId,
    ) -> Result<(), DomainError> {
        if self.fail_attach.load(Ordering::SeqCst) {
            return Err(DomainError::database("order line store unavailable"));
        }
        let license = *license;
        self.with_line(order, line, |o, i| o.lines[i].license = Some(license))
            .await
    }

    async fn set_quantity(
        &self,
        order: &OrderId,
        line: &OrderLineId,
        quantity: u32,
    ) -> Result<(), DomainError> {
        self.with_line(order, line, |o, i| o.lines[i].quantity = quantity)
            .await
    }

    async fn remove_line(&self, order: &OrderId, line: &OrderLineId) -> Result<(), DomainError> {
        self.with_line(order, line, |o, i| {
            o.lines.remove(i);
        })
        .await
    }
}

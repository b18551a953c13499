//! Notice sink port - user-facing messages raised by order-event guards.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

/// Severity of a notice shown to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Status,
    Warning,
    Error,
}

#[async_trait]
pub trait NoticeSink: Send + Sync {
    async fn notify(&self, user: &UserId, level: NoticeLevel, message: &str) -> Result<(), DomainError>;
}

//! In-memory notice sink that records every notice.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{NoticeLevel, NoticeSink};

/// A notice as it was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub user: UserId,
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryNoticeSink {
    notices: Arc<RwLock<Vec<Notice>>>,
}

impl InMemoryNoticeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn notices(&self) -> Vec<Notice> {
        self.notices.read().await.clone()
    }
}

#[async_trait]
impl NoticeSink for InMemoryNoticeSink {
    async fn notify(&self, user: &UserId, level: NoticeLevel, message: &str) -> Result<(), DomainError> {
        self.notices.write().await.push(Notice {
            user: user.clone(),
            level,
            message: message.to_string(),
        });
        Ok(())
    }
}

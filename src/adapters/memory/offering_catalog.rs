//! In-memory offering catalog.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, OfferingId};
use crate::domain::ordering::Offering;
use crate::ports::OfferingCatalog;

#[derive(Debug, Clone, Default)]
pub struct InMemoryOfferingCatalog {
    offerings: Arc<RwLock<HashMap<OfferingId, Offering>>>,
}

impl InMemoryOfferingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, offering: Offering) {
        self.offerings.write().await.insert(offering.id, offering);
    }
}

#[async_trait]
impl OfferingCatalog for InMemoryOfferingCatalog {
    async fn find_by_id(&self, id: &OfferingId) -> Result<Option<Offering>, DomainError> {
        Ok(self.offerings.read().await.get(id).cloned())
    }
}

//! Offering catalog port - read access to purchasable offerings.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OfferingId};
use crate::domain::ordering::Offering;

#[async_trait]
pub trait OfferingCatalog: Send + Sync {
    /// Find an offering by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &OfferingId) -> Result<Option<Offering>, DomainError>;
}

//! In-memory license repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, LicenseId, OfferingId, UserId};
use crate::domain::licensing::License;
use crate::ports::LicenseRepository;

/// Licenses held in a map keyed by id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLicenseRepository {
    licenses: Arc<RwLock<HashMap<LicenseId, License>>>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryLicenseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every save/update/delete fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn all(&self) -> Vec<License> {
        let mut licenses: Vec<License> = self.licenses.read().await.values().cloned().collect();
        licenses.sort_by_key(|l| (l.created(), l.id()));
        licenses
    }

    fn check_writable(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::database("license store unavailable"));
        }
        Ok(())
    }

    async fn select<F>(&self, predicate: F) -> Vec<License>
    where
        F: Fn(&License) -> bool,
    {
        let mut found: Vec<License> = self
            .licenses
            .read()
            .await
            .values()
            .filter(|l| predicate(l))
            .cloned()
            .collect();
        found.sort_by_key(|l| (l.created(), l.id()));
        found
    }
}

#[async_trait]
impl LicenseRepository for InMemoryLicenseRepository {
    async fn save(&self, license: &License) -> Result<(), DomainError> {
        self.check_writable()?;
        let mut licenses = self.licenses.write().await;
        if licenses.contains_key(&license.id()) {
            return Err(DomainError::validation(
                "license_id",
                format!("License {} already exists", license.id()),
            ));
        }
        licenses.insert(license.id(), license.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update(&self, license: &License) -> Result<(), DomainError> {
        self.check_writable()?;
        let mut licenses = self.licenses.write().await;
        match licenses.get_mut(&license.id()) {
            Some(stored) => {
                *stored = license.clone();
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::LicenseNotFound,
                format!("License not found: {}", license.id()),
            )),
        }
    }

    async fn find_by_id(&self, id: &LicenseId) -> Result<Option<License>, DomainError> {
        Ok(self.licenses.read().await.get(id).cloned())
    }

    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<License>, DomainError> {
        Ok(self.select(|l| l.owner() == owner).await)
    }

    async fn find_by_offering_and_owner(
        &self,
        offering: &OfferingId,
        owner: &UserId,
    ) -> Result<Vec<License>, DomainError> {
        Ok(self
            .select(|l| l.offering() == *offering && l.owner() == owner)
            .await)
    }

    async fn delete(&self, id: &LicenseId) -> Result<(), DomainError> {
        self.check_writable()?;
        match self.licenses.write().await.remove(id) {
            Some(_) => {
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::LicenseNotFound,
                format!("License not found: {}", id),
            )),
        }
    }
}

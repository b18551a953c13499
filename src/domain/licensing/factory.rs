//! Builds licenses from a purchase.

use std::sync::Arc;

use crate::domain::foundation::{Clock, UserId};
use crate::domain::ordering::Offering;

use super::{License, LicenseError, LicenseTypeRegistry};

/// Creates unsaved licenses for purchased offerings.
///
/// Persistence and activation are left to the caller, so further field
/// assignment can happen before the first save.
#[derive(Clone)]
pub struct LicenseFactory {
    registry: Arc<LicenseTypeRegistry>,
    clock: Arc<dyn Clock>,
}

impl LicenseFactory {
    pub fn new(registry: Arc<LicenseTypeRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// Returns a `new` license for `owner` carrying the offering's kind,
    /// expiration reference and configured default fields.
    ///
    /// # Errors
    ///
    /// - `Validation` if the offering does not grant a license
    /// - `UnknownKind` if the offering names an unregistered kind
    /// - `Validation` if the offering settings do not fit the kind's schema
    pub fn create_from_purchase(
        &self,
        offering: &Offering,
        owner: UserId,
    ) -> Result<License, LicenseError> {
        let kind = offering.license_kind.as_deref().ok_or_else(|| {
            LicenseError::validation("offering", format!("{} is not licensable", offering.id))
        })?;

        let configured = self
            .registry
            .configure(kind, offering.license_settings.clone())?;

        Ok(License::new(
            kind,
            owner,
            offering.id,
            offering.expiration.clone(),
            configured.default_fields(),
            self.clock.now(),
        ))
    }
}

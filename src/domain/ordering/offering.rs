//! Purchasable offering (product variation).

use serde::{Deserialize, Serialize};

use crate::domain::foundation::OfferingId;
use crate::domain::licensing::{ExpirationPolicyRef, LicenseFields};

/// What a purchase of this offering produces.
///
/// An offering is licensable when it names a license kind; its settings
/// use the field names of that kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offering {
    pub id: OfferingId,
    pub title: String,
    pub license_kind: Option<String>,
    pub license_settings: LicenseFields,
    pub expiration: ExpirationPolicyRef,
    /// Activate as soon as the order is placed instead of on fulfilment.
    pub activate_on_place: bool,
}

impl Offering {
    pub fn licensable(
        id: OfferingId,
        title: impl Into<String>,
        kind: impl Into<String>,
        settings: LicenseFields,
        expiration: ExpirationPolicyRef,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            license_kind: Some(kind.into()),
            license_settings: settings,
            expiration,
            activate_on_place: false,
        }
    }

    /// An offering that grants no license.
    pub fn plain(id: OfferingId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            license_kind: None,
            license_settings: LicenseFields::new(),
            expiration: ExpirationPolicyRef::unlimited(),
            activate_on_place: false,
        }
    }

    pub fn with_activate_on_place(mut self, activate: bool) -> Self {
        self.activate_on_place = activate;
        self
    }

    pub fn is_licensable(&self) -> bool {
        self.license_kind.is_some()
    }
}

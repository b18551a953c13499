//! Pluggable license kinds.

mod registry;
mod role;
mod strategy;

pub use registry::{ConfiguredLicenseType, LicenseTypeRegistry};
pub use role::{RoleLicenseType, ROLE_FIELD};
pub use strategy::{ExistingRights, LicenseTypeDescriptor, LicenseTypeStrategy};

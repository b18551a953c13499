//! Licensing handlers.
//!
//! - `LicenseLifecycle` - persist + publish for every license change
//! - `OrderSyncCoordinator` - order workflow -> license creation/activation/cancellation
//! - `CartQuantityGuard`, `ExistingRightsGuard` - cart-side checks on licensable lines
//! - `AdministerLicenseHandler` - manual administration

mod administer_license;
mod cart_quantity_guard;
mod existing_rights_guard;
mod lifecycle;
mod order_sync;

pub use administer_license::{
    AdministerLicenseHandler, ChangeLicenseOwnerCommand, CreateLicenseCommand, LicenseView,
    TransitionLicenseCommand, UpdateLicenseFieldsCommand,
};
pub use cart_quantity_guard::CartQuantityGuard;
pub use existing_rights_guard::ExistingRightsGuard;
pub use lifecycle::LicenseLifecycle;
pub use order_sync::OrderSyncCoordinator;

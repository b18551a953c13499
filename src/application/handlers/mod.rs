//! Application handlers.
//!
//! Command handlers and order-event subscribers that orchestrate domain
//! operations over the ports.

pub mod licensing;

pub use licensing::{
    AdministerLicenseHandler, CartQuantityGuard, ChangeLicenseOwnerCommand, CreateLicenseCommand,
    ExistingRightsGuard, LicenseLifecycle, LicenseView, OrderSyncCoordinator,
    TransitionLicenseCommand, UpdateLicenseFieldsCommand,
};

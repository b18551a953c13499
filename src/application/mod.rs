//! Application layer - Commands, Handlers and wiring.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;
mod wiring;

pub use handlers::{
    AdministerLicenseHandler, CartQuantityGuard, ChangeLicenseOwnerCommand, CreateLicenseCommand,
    ExistingRightsGuard, LicenseLifecycle, LicenseView, OrderSyncCoordinator,
    TransitionLicenseCommand, UpdateLicenseFieldsCommand,
};
pub use wiring::{LicensingEngine, LicensingPorts};

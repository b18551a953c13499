//! In-memory persistence adapters.
//!
//! Deterministic stand-ins for the storage collaborators, used by tests
//! and local runs. Each write adapter can be switched into a failure mode
//! to exercise error propagation.

mod license_repository;
mod notice_sink;
mod offering_catalog;
mod order_repository;

pub use license_repository::InMemoryLicenseRepository;
pub use notice_sink::{InMemoryNoticeSink, Notice};
pub use offering_catalog::InMemoryOfferingCatalog;
pub use order_repository::InMemoryOrderRepository;

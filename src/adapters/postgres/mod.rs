//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresLicenseRepository` - License aggregate storage

mod license_repository;

pub use license_repository::PostgresLicenseRepository;

//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the licensing domain to external systems:
//! - `events` - Order event dispatcher and the license event bus
//! - `memory` - In-memory repositories, catalog and notice sink
//! - `postgres` - PostgreSQL license storage
//! - `users` - User account stand-in

pub mod events;
pub mod memory;
pub mod postgres;
pub mod users;

pub use events::{InMemoryEventBus, OrderEventDispatcher};
pub use memory::{
    InMemoryLicenseRepository, InMemoryNoticeSink, InMemoryOfferingCatalog,
    InMemoryOrderRepository, Notice,
};
pub use postgres::PostgresLicenseRepository;
pub use users::InMemoryUserAccounts;

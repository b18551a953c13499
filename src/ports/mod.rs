//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the licensing domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `LicenseRepository` - License aggregate storage
//! - `OrderRepository` - Order lines and their license references
//! - `OfferingCatalog` - Purchasable offerings and their license settings
//!
//! ## Collaborator Ports
//!
//! - `UserAccounts` - Owner timezone and role management
//! - `NoticeSink` - User-facing messages
//!
//! ## Event Ports
//!
//! - `OrderEventSubscriber` - Priority-ordered reaction to order notifications
//! - `EventPublisher` / `EventSubscriber` - License events for downstream consumers

mod event_publisher;
mod event_subscriber;
mod license_repository;
mod notice_sink;
mod offering_catalog;
mod order_event_subscriber;
mod order_repository;
mod user_accounts;

pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventBus, EventHandler, EventSubscriber};
pub use license_repository::LicenseRepository;
pub use notice_sink::{NoticeLevel, NoticeSink};
pub use offering_catalog::OfferingCatalog;
pub use order_event_subscriber::OrderEventSubscriber;
pub use order_repository::OrderRepository;
pub use user_accounts::UserAccounts;

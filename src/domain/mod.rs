//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, events)
//! - `licensing` - License records, state machine and license type strategies
//! - `ordering` - Orders, lines and offerings as the licensing engine sees them

pub mod foundation;
pub mod licensing;
pub mod ordering;

//! Event adapters.
//!
//! - `OrderEventDispatcher` - Priority-ordered, in-process delivery of order notifications
//! - `InMemoryEventBus` - Synchronous, in-process bus for license events

mod dispatcher;
mod in_memory;

pub use dispatcher::OrderEventDispatcher;
pub use in_memory::InMemoryEventBus;

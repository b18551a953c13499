//! Ordering domain - The slice of the order workflow that drives licensing.

mod events;
mod offering;
mod order;

pub use events::{OrderEvent, OrderEventKind};
pub use offering::Offering;
pub use order::{Order, OrderLine};

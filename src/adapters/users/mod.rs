//! User account adapters.

mod in_memory;

pub use in_memory::InMemoryUserAccounts;

//! Database provider implementations

mod memory;

pub use memory::InMemoryDatabaseProvider;

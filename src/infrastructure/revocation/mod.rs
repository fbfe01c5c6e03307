//! Durable revocation stores

mod in_memory;
mod postgres;

pub use in_memory::InMemoryRevocationStore;
pub use postgres::PostgresRevocationStore;

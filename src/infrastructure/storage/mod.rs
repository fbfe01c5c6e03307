//! PostgreSQL pool and schema management

pub mod deadline;
pub mod migrations;
pub mod postgres;

pub use deadline::with_deadline;
pub use migrations::{Migration, PostgresMigrator, auth_migrations};
pub use postgres::{PostgresConfig, connect};

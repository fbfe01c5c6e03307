//! User infrastructure module
//!
//! Argon2 password hashing, in-memory and PostgreSQL user stores, and the
//! account service behind the register/login/logout endpoints.

mod password;
mod postgres_repository;
mod repository;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresUserRepository;
pub use repository::InMemoryUserRepository;
pub use service::{AuthService, RegisterRequest, Session};

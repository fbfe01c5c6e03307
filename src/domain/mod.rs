//! Domain layer - Core entities, errors and store traits

pub mod auth;
pub mod error;
pub mod revocation;
pub mod user;

pub use auth::{AuthError, AuthenticatedIdentity, TokenClaims};
pub use error::DomainError;
pub use revocation::{RevocationStore, RevokedToken, TokenId};
pub use user::{NewUser, User, UserId, UserRepository, UserRole, UserState};

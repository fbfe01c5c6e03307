//! Authentication domain
//!
//! Token claims, the rejection taxonomy and the per-request identity.

mod claims;
mod error;

pub use claims::TokenClaims;
pub use error::AuthError;

use crate::domain::user::{User, UserId, UserRole};

/// Identity established for one request by a successful authentication
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub user_id: UserId,
    pub role: UserRole,
    pub user: User,
}

impl AuthenticatedIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

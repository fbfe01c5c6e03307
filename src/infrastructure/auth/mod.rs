//! Authentication infrastructure module
//!
//! JWT signing and verification, the revocation cache and the per-request
//! token authenticator.

mod authenticator;
mod jwt;
mod revocation_cache;

pub use authenticator::{TokenAuthenticator, bearer_token};
pub use jwt::{IssuedToken, JwtConfig, JwtService};
pub use revocation_cache::RevocationCache;

//! Token revocation domain

mod entity;
mod repository;

pub use entity::{RevokedToken, TokenId};
pub use repository::RevocationStore;

#[cfg(test)]
pub use repository::mock::MockRevocationStore;

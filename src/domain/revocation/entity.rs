//! Revoked-token types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::user::UserId;

/// Opaque identifier of a bearer token.
///
/// Derived as the hex SHA-256 digest of the raw token so that neither the
/// cache nor the durable store ever holds a usable credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    /// Identifier for a raw bearer token
    pub fn from_bearer(token: &str) -> Self {
        let digest = Sha256::digest(token.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Durable record of an explicitly revoked token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokedToken {
    pub token_id: TokenId,
    pub user_id: UserId,
    pub revoked_at: DateTime<Utc>,
    /// The token's own expiry; the record is meaningless after this instant
    pub expires_at: DateTime<Utc>,
}

impl RevokedToken {
    pub fn new(token_id: TokenId, user_id: UserId, expires_at: DateTime<Utc>) -> Self {
        Self {
            token_id,
            user_id,
            revoked_at: Utc::now(),
            expires_at,
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

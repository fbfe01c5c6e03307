//! Bearer token claims

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::{User, UserId, UserRole, UserState};

/// Claims carried by every bearer token.
///
/// Decoding into this type is the single point where claim presence and
/// types are checked: a token lacking `user_id`, `state` or `role`, or
/// carrying any of them with a non-integer value, fails to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: u64,
    pub state: i64,
    pub role: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl TokenClaims {
    /// Claims for a freshly issued token
    pub fn for_user(user: &User, ttl: Duration) -> Option<Self> {
        Self::for_user_at(user, ttl, Utc::now())
    }

    /// `None` when `issued_at + ttl` falls outside the representable range
    pub fn for_user_at(user: &User, ttl: Duration, issued_at: DateTime<Utc>) -> Option<Self> {
        let expires_at = issued_at.checked_add_signed(ttl)?;

        Some(Self {
            user_id: user.id().value(),
            state: user.state().code(),
            role: user.role().code(),
            exp: expires_at.timestamp(),
            iat: Some(issued_at.timestamp()),
        })
    }

    pub fn user_id(&self) -> UserId {
        UserId::new(self.user_id)
    }

    /// `None` for a state code this service does not know
    pub fn account_state(&self) -> Option<UserState> {
        UserState::from_code(self.state)
    }

    pub fn account_role(&self) -> Option<UserRole> {
        UserRole::from_code(self.role)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

use thiserror::Error;

/// Why a bearer credential was rejected.
///
/// This is the complete client-facing taxonomy. Storage failures and other
/// internal problems surface as `Unauthorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("token expired")]
    TokenExpired,

    #[error("token revoked")]
    TokenRevoked,

    #[error("token invalid")]
    TokenInvalid,
}

impl AuthError {
    /// Value of the `error` field in the response body
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::TokenExpired => "token_expired",
            Self::TokenRevoked => "token_revoked",
            Self::TokenInvalid => "token_invalid",
        }
    }

    /// Machine-readable code; plain `Unauthorized` deliberately has none
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Unauthorized => None,
            Self::TokenExpired => Some("TOKEN_EXPIRED"),
            Self::TokenRevoked => Some("TOKEN_REVOKED"),
            Self::TokenInvalid => Some("TOKEN_INVALID"),
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Unauthorized => None,
            Self::TokenExpired => Some("Your session has expired. Please log in again."),
            Self::TokenRevoked => Some("Your session has been logged out. Please log in again."),
            Self::TokenInvalid => Some("Invalid authentication token. Please log in again."),
        }
    }
}

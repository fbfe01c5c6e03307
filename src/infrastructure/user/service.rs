//! Account registration, login and logout

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::domain::user::{validate_email, validate_password, validate_username};
use crate::domain::{
    DomainError, NewUser, RevocationStore, RevokedToken, TokenId, User, UserId, UserRepository,
};
use crate::infrastructure::auth::{IssuedToken, JwtService, RevocationCache};
use crate::infrastructure::storage::with_deadline;

use super::password::PasswordHasher;

/// Request for creating a new account
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// An account together with a freshly issued token
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: IssuedToken,
}

#[derive(Debug, Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    jwt: Arc<JwtService>,
    revocations: Arc<dyn RevocationStore>,
    cache: Arc<RevocationCache>,
    /// Bound on every user and revocation store call
    store_timeout: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        jwt: Arc<JwtService>,
        revocations: Arc<dyn RevocationStore>,
        cache: Arc<RevocationCache>,
    ) -> Self {
        Self {
            users,
            hasher,
            jwt,
            revocations,
            cache,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Create an active, regular account and sign the caller in
    pub async fn register(&self, request: RegisterRequest) -> Result<Session, DomainError> {
        validate_username(&request.username).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_email(&request.email).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_password(&request.password).map_err(|e| DomainError::validation(e.to_string()))?;

        let taken = with_deadline(
            self.store_timeout,
            "user existence check",
            self.users
                .exists_by_email_or_username(&request.email, &request.username),
        )
        .await?;
        if taken {
            return Err(DomainError::conflict(
                "User with this email or username already exists",
            ));
        }

        let password_hash = self.hash_password(request.password).await?;
        let user = with_deadline(
            self.store_timeout,
            "user create",
            self.users
                .create(NewUser::active(request.username, request.email, password_hash)),
        )
        .await?;

        info!(user_id = %user.id(), username = %user.username(), "User registered");

        let token = self.jwt.generate(&user)?;
        Ok(Session { user, token })
    }

    /// Check credentials and issue a token
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, DomainError> {
        let user = with_deadline(
            self.store_timeout,
            "user lookup",
            self.users.get_by_email(email),
        )
        .await?
        .ok_or(DomainError::InvalidCredentials)?;

        if !self.verify_password(password, &user).await? {
            return Err(DomainError::InvalidCredentials);
        }

        if !user.is_active() {
            return Err(DomainError::AccountInactive);
        }

        info!(user_id = %user.id(), "User logged in");

        let token = self.jwt.generate(&user)?;
        Ok(Session { user, token })
    }

    /// Revoke `token` until its own expiry.
    ///
    /// The durable record is written first; the cache is only updated once
    /// the store has accepted it.
    pub async fn logout(&self, token: &str, user_id: UserId) -> Result<(), DomainError> {
        let claims = self
            .jwt
            .verify(token)
            .map_err(|e| DomainError::token(e.to_string()))?;
        let expires_at = claims
            .expires_at()
            .ok_or_else(|| DomainError::token("Token expiry out of range"))?;

        let token_id = TokenId::from_bearer(token);
        with_deadline(
            self.store_timeout,
            "revocation record",
            self.revocations
                .record_revocation(RevokedToken::new(token_id.clone(), user_id, expires_at)),
        )
        .await?;
        self.cache.add(token_id, expires_at);

        info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    pub async fn current_user(&self, id: UserId) -> Result<User, DomainError> {
        with_deadline(self.store_timeout, "user lookup", self.users.get(id))
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))
    }

    async fn hash_password(&self, password: String) -> Result<String, DomainError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, user: &User) -> Result<bool, DomainError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let hash = user.password_hash().to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| DomainError::internal(format!("Password verification task failed: {}", e)))
    }
}

//! Bearer token authentication
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. `Authorization: Bearer <token>` is present
//! 2. the revocation cache does not hold the token
//! 3. the durable store has no unexpired revocation (a hit is cached)
//! 4. HS256 signature verifies
//! 5. the token has not expired
//! 6. claims are present and well-typed
//! 7. the account state claim is active
//! 8. the user still exists and is active
//!
//! Store failures and timeouts reject the request as `Unauthorized`.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, header::AUTHORIZATION};
use tracing::warn;

use super::jwt::JwtService;
use super::revocation_cache::RevocationCache;
use crate::domain::{
    AuthError, AuthenticatedIdentity, RevocationStore, TokenId, UserRepository, UserState,
};
use crate::infrastructure::storage::with_deadline;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the raw token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[derive(Debug, Clone)]
pub struct TokenAuthenticator {
    jwt: Arc<JwtService>,
    cache: Arc<RevocationCache>,
    revocations: Arc<dyn RevocationStore>,
    users: Arc<dyn UserRepository>,
    store_timeout: Duration,
}

impl TokenAuthenticator {
    pub fn new(
        jwt: Arc<JwtService>,
        cache: Arc<RevocationCache>,
        revocations: Arc<dyn RevocationStore>,
        users: Arc<dyn UserRepository>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            jwt,
            cache,
            revocations,
            users,
            store_timeout,
        }
    }

    /// Authenticate the request carrying `headers`
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedIdentity, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::Unauthorized)?;
        self.authenticate_token(token).await
    }

    pub async fn authenticate_token(&self, token: &str) -> Result<AuthenticatedIdentity, AuthError> {
        let token_id = TokenId::from_bearer(token);

        if self.cache.is_revoked(&token_id) {
            return Err(AuthError::TokenRevoked);
        }

        let revocation = with_deadline(
            self.store_timeout,
            "revocation lookup",
            self.revocations.find_active_revocation(&token_id),
        )
        .await
        .map_err(|e| {
            warn!(error = %e, "Revocation lookup failed, rejecting request");
            AuthError::Unauthorized
        })?;

        if let Some(expires_at) = revocation {
            self.cache.add(token_id, expires_at);
            return Err(AuthError::TokenRevoked);
        }

        let claims = self.jwt.verify(token)?;
        let role = claims.account_role().ok_or(AuthError::TokenInvalid)?;

        if claims.account_state() != Some(UserState::Active) {
            return Err(AuthError::Unauthorized);
        }

        let user = with_deadline(
            self.store_timeout,
            "user lookup",
            self.users.get(claims.user_id()),
        )
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %claims.user_id(), "User lookup failed, rejecting request");
            AuthError::Unauthorized
        })?
        .ok_or(AuthError::Unauthorized)?;

        if !user.is_active() {
            return Err(AuthError::Unauthorized);
        }

        Ok(AuthenticatedIdentity {
            user_id: user.id(),
            role,
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::revocation::MockRevocationStore;
    use crate::domain::user::MockUserRepository;
    use crate::domain::{NewUser, RevokedToken, TokenClaims, User, UserId, UserRole};
    use crate::infrastructure::auth::JwtConfig;
    use axum::http::HeaderValue;
    use chrono::Utc;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use serde_json::json;

    const SECRET: &str = "authenticator-secret";

    struct Fixture {
        authenticator: TokenAuthenticator,
        jwt: Arc<JwtService>,
        cache: Arc<RevocationCache>,
        revocations: Arc<MockRevocationStore>,
        users: Arc<MockUserRepository>,
    }

    fn fixture() -> Fixture {
        fixture_with_timeout(Duration::from_secs(5))
    }

    fn fixture_with_timeout(store_timeout: Duration) -> Fixture {
        let jwt = Arc::new(JwtService::new(JwtConfig::new(SECRET, chrono::Duration::hours(1))));
        let cache = Arc::new(RevocationCache::new(chrono::Duration::minutes(10)));
        let revocations = Arc::new(MockRevocationStore::new());
        let users = Arc::new(MockUserRepository::new());

        let authenticator = TokenAuthenticator::new(
            jwt.clone(),
            cache.clone(),
            revocations.clone(),
            users.clone(),
            store_timeout,
        );

        Fixture {
            authenticator,
            jwt,
            cache,
            revocations,
            users,
        }
    }

    impl Fixture {
        async fn active_user(&self) -> User {
            self.users
                .create(NewUser::active("alice", "alice@example.com", "hash"))
                .await
                .unwrap()
        }

        fn token_for(&self, user: &User) -> String {
            self.jwt.generate(user).unwrap().token
        }

        fn sign_raw(&self, value: serde_json::Value) -> String {
            encode(
                &Header::new(Algorithm::HS256),
                &value,
                &EncodingKey::from_secret(SECRET.as_bytes()),
            )
            .unwrap()
        }
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn future_exp() -> i64 {
        (Utc::now() + chrono::Duration::hours(1)).timestamp()
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers_with("Bearer   abc ")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Basic dXNlcg==")), None);
        assert_eq!(bearer_token(&headers_with("bearer abc")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_valid_token_authenticates() {
        let f = fixture();
        let user = f.active_user().await;
        let token = f.token_for(&user);

        let identity = f
            .authenticator
            .authenticate(&headers_with(&format!("Bearer {}", token)))
            .await
            .unwrap();

        assert_eq!(identity.user_id, user.id());
        assert_eq!(identity.role, UserRole::User);
        assert_eq!(identity.user.username(), "alice");
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header() {
        let f = fixture();

        let missing = f.authenticator.authenticate(&HeaderMap::new()).await;
        assert_eq!(missing.unwrap_err(), AuthError::Unauthorized);

        let wrong_scheme = f.authenticator.authenticate(&headers_with("Token abc")).await;
        assert_eq!(wrong_scheme.unwrap_err(), AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn test_cached_revocation_skips_store() {
        let f = fixture();
        let user = f.active_user().await;
        let token = f.token_for(&user);
        f.cache
            .add(TokenId::from_bearer(&token), Utc::now() + chrono::Duration::hours(1));

        let result = f.authenticator.authenticate_token(&token).await;

        assert_eq!(result.unwrap_err(), AuthError::TokenRevoked);
        assert_eq!(f.revocations.lookups(), 0);
    }

    #[tokio::test]
    async fn test_store_revocation_populates_cache() {
        let f = fixture();
        let user = f.active_user().await;
        let token = f.token_for(&user);
        let token_id = TokenId::from_bearer(&token);
        f.revocations
            .record_revocation(RevokedToken::new(
                token_id.clone(),
                user.id(),
                Utc::now() + chrono::Duration::hours(1),
            ))
            .await
            .unwrap();

        let first = f.authenticator.authenticate_token(&token).await;
        assert_eq!(first.unwrap_err(), AuthError::TokenRevoked);
        assert!(f.cache.is_revoked(&token_id));
        assert_eq!(f.revocations.lookups(), 1);

        let second = f.authenticator.authenticate_token(&token).await;
        assert_eq!(second.unwrap_err(), AuthError::TokenRevoked);
        assert_eq!(f.revocations.lookups(), 1);
    }

    #[tokio::test]
    async fn test_revoked_wins_over_invalid_signature() {
        let f = fixture();
        let token = "definitely.not.valid";
        f.cache
            .add(TokenId::from_bearer(token), Utc::now() + chrono::Duration::hours(1));

        let result = f.authenticator.authenticate_token(token).await;
        assert_eq!(result.unwrap_err(), AuthError::TokenRevoked);
    }

    #[tokio::test]
    async fn test_store_failure_fails_closed() {
        let f = fixture();
        let user = f.active_user().await;
        let token = f.token_for(&user);
        f.revocations.set_should_fail(true).await;

        let result = f.authenticator.authenticate_token(&token).await;
        assert_eq!(result.unwrap_err(), AuthError::Unauthorized);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out_as_unauthorized() {
        let f = fixture_with_timeout(Duration::from_millis(100));
        let user = f.active_user().await;
        let token = f.token_for(&user);
        f.revocations.set_delay(Duration::from_secs(10)).await;

        let result = f.authenticator.authenticate_token(&token).await;
        assert_eq!(result.unwrap_err(), AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn test_expired_token() {
        let f = fixture();
        let user = f.active_user().await;
        let claims = TokenClaims::for_user_at(
            &user,
            chrono::Duration::hours(1),
            Utc::now() - chrono::Duration::hours(3),
        )
        .unwrap();
        let token = f.jwt.sign(&claims).unwrap();

        let result = f.authenticator.authenticate_token(&token).await;
        assert_eq!(result.unwrap_err(), AuthError::TokenExpired);
    }

    #[tokio::test]
    async fn test_bad_signature_is_invalid() {
        let f = fixture();
        let user = f.active_user().await;
        let other = JwtService::new(JwtConfig::new("someone-else", chrono::Duration::hours(1)));
        let token = other.generate(&user).unwrap().token;

        let result = f.authenticator.authenticate_token(&token).await;
        assert_eq!(result.unwrap_err(), AuthError::TokenInvalid);
    }

    #[tokio::test]
    async fn test_missing_role_claim_is_invalid() {
        let f = fixture();
        let token = f.sign_raw(json!({ "user_id": 1, "state": 0, "exp": future_exp() }));

        let result = f.authenticator.authenticate_token(&token).await;
        assert_eq!(result.unwrap_err(), AuthError::TokenInvalid);
    }

    #[tokio::test]
    async fn test_unknown_role_code_is_invalid() {
        let f = fixture();
        let token = f.sign_raw(json!({ "user_id": 1, "state": 0, "role": 42, "exp": future_exp() }));

        let result = f.authenticator.authenticate_token(&token).await;
        assert_eq!(result.unwrap_err(), AuthError::TokenInvalid);
    }

    #[tokio::test]
    async fn test_inactive_state_claim_is_unauthorized() {
        let f = fixture();
        f.active_user().await;
        let token = f.sign_raw(json!({ "user_id": 1, "state": 1, "role": 0, "exp": future_exp() }));

        let result = f.authenticator.authenticate_token(&token).await;
        assert_eq!(result.unwrap_err(), AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn test_unknown_user_is_unauthorized() {
        let f = fixture();
        let token = f.sign_raw(json!({ "user_id": 999, "state": 0, "role": 0, "exp": future_exp() }));

        let result = f.authenticator.authenticate_token(&token).await;
        assert_eq!(result.unwrap_err(), AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn test_deactivated_account_is_unauthorized() {
        let f = fixture();
        let mut user = f.active_user().await;
        let token = f.token_for(&user);

        user.set_state(UserState::Inactive);
        f.users.replace(user).await;

        let result = f.authenticator.authenticate_token(&token).await;
        assert_eq!(result.unwrap_err(), AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn test_user_store_failure_is_unauthorized() {
        let f = fixture();
        let user = f.active_user().await;
        let token = f.token_for(&user);
        f.users.set_should_fail(true).await;

        let result = f.authenticator.authenticate_token(&token).await;
        assert_eq!(result.unwrap_err(), AuthError::Unauthorized);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_user_store_times_out_as_unauthorized() {
        let f = fixture_with_timeout(Duration::from_millis(100));
        let user = f.active_user().await;
        let token = f.token_for(&user);
        f.users.set_delay(Duration::from_secs(10)).await;

        let result = f.authenticator.authenticate_token(&token).await;
        assert_eq!(result.unwrap_err(), AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn test_deleted_user_is_unauthorized() {
        let f = fixture();
        let user = f.active_user().await;
        let token = f.token_for(&user);
        assert!(f.users.delete(user.id()).await.unwrap());

        let result = f.authenticator.authenticate_token(&token).await;
        assert_eq!(result.unwrap_err(), AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn test_role_comes_from_claims() {
        let f = fixture();
        let user = f.active_user().await;
        let token = f.sign_raw(json!({
            "user_id": user.id().value(),
            "state": 0,
            "role": UserRole::Admin.code(),
            "exp": future_exp(),
        }));

        let identity = f.authenticator.authenticate_token(&token).await.unwrap();
        assert!(identity.is_admin());
        assert_eq!(identity.user_id, UserId::new(user.id().value()));
    }
}

//! JWT token generation and verification

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

use crate::domain::{AuthError, DomainError, TokenClaims, User};

/// Configuration for JWT service
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret
    pub secret: String,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, token_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            token_ttl,
        }
    }
}

impl Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[hidden]")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

/// A freshly signed bearer token
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 token signer and verifier.
///
/// Verification accepts HS256 only, so a token whose header names any other
/// algorithm (including `none`) is rejected before its claims are looked at.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &self.config)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    pub fn token_ttl(&self) -> Duration {
        self.config.token_ttl
    }

    /// Sign a token for `user` valid for the configured TTL
    pub fn generate(&self, user: &User) -> Result<IssuedToken, DomainError> {
        let claims = TokenClaims::for_user(user, self.config.token_ttl)
            .ok_or_else(|| DomainError::internal("Token expiry out of range"))?;
        let expires_at = claims
            .expires_at()
            .ok_or_else(|| DomainError::internal("Token expiry out of range"))?;

        Ok(IssuedToken {
            token: self.sign(&claims)?,
            expires_at,
        })
    }

    pub fn sign(&self, claims: &TokenClaims) -> Result<String, DomainError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to generate JWT: {}", e)))
    }

    /// Check signature, algorithm and expiry, then decode the claims.
    ///
    /// An expired but otherwise well-signed token yields `TokenExpired`.
    /// Every other failure, including missing or wrong-typed claims, yields
    /// `TokenInvalid`.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<serde_json::Value>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "JWT verification failed");
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::TokenInvalid,
                }
            })?;

        serde_json::from_value::<TokenClaims>(data.claims).map_err(|e| {
            debug!(error = %e, "JWT claims malformed");
            AuthError::TokenInvalid
        })
    }
}

//! PostgreSQL revocation store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{DomainError, RevocationStore, RevokedToken, TokenId};

/// Revoked tokens persisted in the `revoked_tokens` table
#[derive(Debug, Clone)]
pub struct PostgresRevocationStore {
    pool: PgPool,
}

impl PostgresRevocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete records whose token has expired
    pub async fn purge_expired(&self) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to purge revoked tokens: {}", e)))?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl RevocationStore for PostgresRevocationStore {
    async fn find_active_revocation(
        &self,
        token_id: &TokenId,
    ) -> Result<Option<DateTime<Utc>>, DomainError> {
        sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT expires_at FROM revoked_tokens WHERE token_id = $1 AND expires_at > NOW()",
        )
        .bind(token_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to look up revoked token: {}", e)))
    }

    async fn record_revocation(&self, record: RevokedToken) -> Result<(), DomainError> {
        let user_id = i64::try_from(record.user_id.value()).map_err(|_| {
            DomainError::validation(format!("User id {} out of range", record.user_id))
        })?;

        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (token_id, user_id, revoked_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (token_id) DO NOTHING
            "#,
        )
        .bind(record.token_id.as_str())
        .bind(user_id)
        .bind(record.revoked_at)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to record revoked token: {}", e)))?;

        Ok(())
    }
}

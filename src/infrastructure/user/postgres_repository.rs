//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::DomainError;
use crate::domain::user::{NewUser, User, UserId, UserRepository, UserRole, UserState};

/// PostgreSQL implementation of UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let Ok(id) = i64::try_from(id.value()) else {
            return Ok(None);
        };

        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, state, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, state, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get user by email: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn exists_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR username = $2)",
        )
        .bind(email)
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to check user existence: {}", e)))
    }

    async fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, state, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, state, role, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.state.code() as i16)
        .bind(user.role.code() as i16)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DomainError::conflict("User with this email or username already exists")
            }
            e => DomainError::storage(format!("Failed to create user: {}", e)),
        })?;

        row_to_user(&row)
    }

    async fn delete(&self, id: UserId) -> Result<bool, DomainError> {
        let Ok(id) = i64::try_from(id.value()) else {
            return Ok(false);
        };

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete user: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> Result<User, DomainError> {
    let id: i64 = row.get("id");
    let state: i16 = row.get("state");
    let role: i16 = row.get("role");

    let id = u64::try_from(id)
        .map_err(|_| DomainError::storage(format!("Invalid user id in database: {}", id)))?;
    let state = UserState::from_code(i64::from(state))
        .ok_or_else(|| DomainError::storage(format!("Unknown user state in database: {}", state)))?;
    let role = UserRole::from_code(i64::from(role))
        .ok_or_else(|| DomainError::storage(format!("Unknown user role in database: {}", role)))?;

    Ok(User::restore(
        UserId::new(id),
        row.get("username"),
        row.get("email"),
        row.get("password_hash"),
        state,
        role,
        row.get("created_at"),
        row.get("updated_at"),
    ))
}

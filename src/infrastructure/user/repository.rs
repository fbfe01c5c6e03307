//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::DomainError;
use crate::domain::user::{NewUser, User, UserId, UserRepository};

#[derive(Debug, Default)]
struct UserTable {
    rows: HashMap<u64, User>,
    last_id: u64,
}

/// In-memory implementation of UserRepository, used when no database is configured
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    table: Arc<RwLock<UserTable>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.table.read().await.rows.get(&id.value()).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.email() == email).cloned())
    }

    async fn exists_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<bool, DomainError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .any(|u| u.email() == email || u.username() == username))
    }

    async fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let mut table = self.table.write().await;

        if table
            .rows
            .values()
            .any(|u| u.email() == user.email || u.username() == user.username)
        {
            return Err(DomainError::conflict(
                "User with this email or username already exists",
            ));
        }

        table.last_id += 1;
        let id = table.last_id;
        let user = User::from_new(UserId::new(id), user);
        table.rows.insert(id, user.clone());

        Ok(user)
    }

    async fn delete(&self, id: UserId) -> Result<bool, DomainError> {
        Ok(self.table.write().await.rows.remove(&id.value()).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryUserRepository::new();

        let created = repo
            .create(NewUser::active("alice", "alice@example.com", "hash"))
            .await
            .unwrap();

        assert_eq!(created.id(), UserId::new(1));
        let fetched = repo.get(created.id()).await.unwrap().unwrap();
        assert_eq!(fetched.username(), "alice");

        let by_email = repo.get_by_email("alice@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id()), Some(created.id()));
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create(NewUser::active("alice", "alice@example.com", "hash"))
            .await
            .unwrap();

        let same_email = repo
            .create(NewUser::active("alice2", "alice@example.com", "hash"))
            .await;
        assert!(matches!(same_email, Err(DomainError::Conflict { .. })));

        assert!(
            repo.exists_by_email_or_username("other@example.com", "alice")
                .await
                .unwrap()
        );
        assert!(
            !repo
                .exists_by_email_or_username("other@example.com", "bob")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryUserRepository::new();
        let user = repo
            .create(NewUser::active("bob", "bob@example.com", "hash"))
            .await
            .unwrap();

        assert!(repo.delete(user.id()).await.unwrap());
        assert!(!repo.delete(user.id()).await.unwrap());
        assert!(repo.get(user.id()).await.unwrap().is_none());
    }
}

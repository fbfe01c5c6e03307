//! In-memory revocation store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::domain::{DomainError, RevocationStore, RevokedToken, TokenId};
use crate::infrastructure::tasks::Sweep;

/// Process-local revocation store for running without a database.
///
/// Records live until their token expires; the sweep drops them after that.
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    records: RwLock<HashMap<TokenId, RevokedToken>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, record| record.is_active_at(now));
        before - records.len()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn find_active_revocation(
        &self,
        token_id: &TokenId,
    ) -> Result<Option<DateTime<Utc>>, DomainError> {
        let now = Utc::now();
        Ok(self
            .records
            .read()
            .get(token_id)
            .filter(|record| record.is_active_at(now))
            .map(|record| record.expires_at))
    }

    async fn record_revocation(&self, record: RevokedToken) -> Result<(), DomainError> {
        self.records
            .write()
            .entry(record.token_id.clone())
            .or_insert(record);
        Ok(())
    }
}

impl Sweep for InMemoryRevocationStore {
    fn name(&self) -> &'static str {
        "revocation_store"
    }

    fn sweep(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use chrono::Duration;

    #[tokio::test]
    async fn test_record_and_find() {
        let store = InMemoryRevocationStore::new();
        let id = TokenId::from_bearer("abc");
        let expires_at = Utc::now() + Duration::hours(1);

        store
            .record_revocation(RevokedToken::new(id.clone(), UserId::new(1), expires_at))
            .await
            .unwrap();

        assert_eq!(store.find_active_revocation(&id).await.unwrap(), Some(expires_at));
        assert_eq!(
            store
                .find_active_revocation(&TokenId::from_bearer("other"))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_expired_record_is_not_active() {
        let store = InMemoryRevocationStore::new();
        let id = TokenId::from_bearer("old");

        store
            .record_revocation(RevokedToken::new(
                id.clone(),
                UserId::new(1),
                Utc::now() - Duration::seconds(1),
            ))
            .await
            .unwrap();

        assert_eq!(store.find_active_revocation(&id).await.unwrap(), None);
        assert_eq!(store.sweep(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_repeat_revocation_is_idempotent() {
        let store = InMemoryRevocationStore::new();
        let id = TokenId::from_bearer("twice");
        let expires_at = Utc::now() + Duration::hours(1);

        for _ in 0..2 {
            store
                .record_revocation(RevokedToken::new(id.clone(), UserId::new(1), expires_at))
                .await
                .unwrap();
        }

        assert_eq!(store.len(), 1);
    }
}

//! Durable revocation store trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::entity::{RevokedToken, TokenId};
use crate::domain::DomainError;

/// Source of truth for revoked tokens
#[async_trait]
pub trait RevocationStore: Send + Sync + Debug {
    /// Expiry of an unexpired revocation for this token, if one exists
    async fn find_active_revocation(
        &self,
        token_id: &TokenId,
    ) -> Result<Option<DateTime<Utc>>, DomainError>;

    /// Persist a revocation
    async fn record_revocation(&self, record: RevokedToken) -> Result<(), DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::RwLock;

    /// Mock revocation store for testing
    #[derive(Debug, Default)]
    pub struct MockRevocationStore {
        records: Arc<RwLock<HashMap<TokenId, RevokedToken>>>,
        should_fail: Arc<RwLock<bool>>,
        delay: Arc<RwLock<Option<Duration>>>,
        lookups: AtomicUsize,
    }

    impl MockRevocationStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn set_should_fail(&self, fail: bool) {
            *self.should_fail.write().await = fail;
        }

        pub async fn set_delay(&self, delay: Duration) {
            *self.delay.write().await = Some(delay);
        }

        /// Number of `find_active_revocation` calls served so far
        pub fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }

        async fn check_should_fail(&self) -> Result<(), DomainError> {
            let delay = *self.delay.read().await;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if *self.should_fail.read().await {
                return Err(DomainError::storage("Mock store configured to fail"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RevocationStore for MockRevocationStore {
        async fn find_active_revocation(
            &self,
            token_id: &TokenId,
        ) -> Result<Option<DateTime<Utc>>, DomainError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.check_should_fail().await?;

            let now = Utc::now();
            let records = self.records.read().await;
            Ok(records
                .get(token_id)
                .filter(|r| r.is_active_at(now))
                .map(|r| r.expires_at))
        }

        async fn record_revocation(&self, record: RevokedToken) -> Result<(), DomainError> {
            self.check_should_fail().await?;
            self.records
                .write()
                .await
                .insert(record.token_id.clone(), record);
            Ok(())
        }
    }
}

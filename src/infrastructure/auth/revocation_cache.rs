//! In-memory record of revoked tokens
//!
//! The cache is a fast path in front of the durable revocation store. It
//! answers "is this token revoked?" without touching storage for tokens
//! revoked by this process or already seen revoked in storage. Entries are
//! removed lazily on read once the token itself has expired, and in bulk by
//! the periodic sweep once they are older than the grace period.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use crate::domain::TokenId;
use crate::infrastructure::tasks::Sweep;

/// Revoked token ids mapped to the expiry of the token they identify
#[derive(Debug)]
pub struct RevocationCache {
    entries: RwLock<HashMap<TokenId, DateTime<Utc>>>,
    grace: Duration,
}

impl RevocationCache {
    /// `grace` is how long past its expiry an entry survives the sweep
    pub fn new(grace: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            grace,
        }
    }

    /// Record a revocation; a later add for the same id replaces the expiry
    pub fn add(&self, token_id: TokenId, expires_at: DateTime<Utc>) {
        self.entries.write().insert(token_id, expires_at);
    }

    pub fn is_revoked(&self, token_id: &TokenId) -> bool {
        self.is_revoked_at(token_id, Utc::now())
    }

    /// True only while the revoked token has not yet expired.
    ///
    /// An entry found expired is removed before returning false.
    pub fn is_revoked_at(&self, token_id: &TokenId, now: DateTime<Utc>) -> bool {
        let expires_at = match self.entries.read().get(token_id).copied() {
            Some(expires_at) => expires_at,
            None => return false,
        };

        if expires_at > now {
            return true;
        }

        let mut entries = self.entries.write();
        // Another caller may have re-added the id between the two locks
        if entries.get(token_id).is_some_and(|exp| *exp <= now) {
            entries.remove(token_id);
        }
        false
    }

    /// Remove entries that expired more than `grace` before `now`
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        // A grace reaching past the earliest instant keeps everything
        let Some(cutoff) = now.checked_sub_signed(self.grace) else {
            return 0;
        };
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at >= cutoff);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Sweep for RevocationCache {
    fn name(&self) -> &'static str {
        "revocation_cache"
    }

    fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn cache() -> RevocationCache {
        RevocationCache::new(Duration::minutes(10))
    }

    #[test]
    fn test_revoked_until_expiry() {
        let cache = cache();
        let now = Utc::now();
        let id = TokenId::from_bearer("token-a");

        cache.add(id.clone(), now + Duration::hours(1));

        assert!(cache.is_revoked_at(&id, now));
        assert!(cache.is_revoked_at(&id, now + Duration::minutes(59)));
    }

    #[test]
    fn test_unknown_token_is_not_revoked() {
        let cache = cache();
        assert!(!cache.is_revoked(&TokenId::from_bearer("never-added")));
    }

    #[test]
    fn test_expired_entry_is_removed_on_read() {
        let cache = cache();
        let now = Utc::now();
        let id = TokenId::from_bearer("token-b");

        cache.add(id.clone(), now + Duration::seconds(30));
        assert_eq!(cache.len(), 1);

        assert!(!cache.is_revoked_at(&id, now + Duration::seconds(30)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_already_expired_add_reads_as_not_revoked() {
        let cache = cache();
        let now = Utc::now();
        let id = TokenId::from_bearer("token-c");

        cache.add(id.clone(), now - Duration::seconds(1));

        assert!(!cache.is_revoked_at(&id, now));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_re_add_updates_expiry() {
        let cache = cache();
        let now = Utc::now();
        let id = TokenId::from_bearer("token-d");

        cache.add(id.clone(), now + Duration::seconds(10));
        cache.add(id.clone(), now + Duration::hours(2));

        assert!(cache.is_revoked_at(&id, now + Duration::hours(1)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_sweep_honours_grace() {
        let cache = cache();
        let now = Utc::now();
        let stale = TokenId::from_bearer("stale");
        let recent = TokenId::from_bearer("recently-expired");
        let live = TokenId::from_bearer("live");

        cache.add(stale, now - Duration::minutes(11));
        cache.add(recent.clone(), now - Duration::minutes(5));
        cache.add(live.clone(), now + Duration::minutes(5));

        assert_eq!(cache.sweep_at(now), 1);
        assert_eq!(cache.len(), 2);
        assert!(cache.is_revoked_at(&live, now));
    }

    #[test]
    fn test_sweep_with_unbounded_grace_keeps_entries() {
        let cache = RevocationCache::new(Duration::days(100_000_000));
        let now = Utc::now();
        cache.add(TokenId::from_bearer("old"), now - Duration::days(365));

        assert_eq!(cache.sweep_at(now), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_sweep_empty_cache() {
        assert_eq!(cache().sweep(), 0);
    }

    #[test]
    fn test_concurrent_add_and_read() {
        let cache = Arc::new(cache());
        let expires_at = Utc::now() + Duration::hours(1);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let id = TokenId::from_bearer(&format!("token-{}", i));
                    cache.add(id.clone(), expires_at);
                    cache.is_revoked(&id)
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(cache.len(), 8);
    }
}

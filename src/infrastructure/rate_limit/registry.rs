//! Per-client limiter registry

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::token_bucket::{RateLimitProfile, TokenBucketLimiter};
use crate::infrastructure::tasks::Sweep;

#[derive(Debug)]
struct ClientEntry {
    limiter: Arc<TokenBucketLimiter>,
    last_seen: Instant,
}

/// Lazily creates one [`TokenBucketLimiter`] per client key and forgets
/// clients that have been idle for longer than `max_idle`.
///
/// All limiters in a registry share one profile. Separate profiles (for
/// example a strict one for login) use separate registries.
#[derive(Debug)]
pub struct ClientLimiterRegistry {
    name: &'static str,
    profile: RateLimitProfile,
    max_idle: Duration,
    clients: Mutex<HashMap<String, ClientEntry>>,
}

impl ClientLimiterRegistry {
    pub fn new(name: &'static str, profile: RateLimitProfile, max_idle: Duration) -> Self {
        Self {
            name,
            profile,
            max_idle,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn profile(&self) -> &RateLimitProfile {
        &self.profile
    }

    /// Limiter for `client_key`, created with a full bucket on first use
    pub fn get_limiter(&self, client_key: &str) -> Arc<TokenBucketLimiter> {
        self.get_limiter_at(client_key, Instant::now())
    }

    pub fn get_limiter_at(&self, client_key: &str, now: Instant) -> Arc<TokenBucketLimiter> {
        let mut clients = self.clients.lock();

        if let Some(entry) = clients.get_mut(client_key) {
            entry.last_seen = now;
            return entry.limiter.clone();
        }

        let limiter = Arc::new(TokenBucketLimiter::new_at(self.profile, now));
        clients.insert(
            client_key.to_string(),
            ClientEntry {
                limiter: limiter.clone(),
                last_seen: now,
            },
        );
        limiter
    }

    /// Look up the client's limiter and try to consume a token
    pub fn check(&self, client_key: &str) -> bool {
        self.get_limiter(client_key).allow()
    }

    /// Drop clients idle for longer than `max_idle`; returns how many were dropped
    pub fn evict_idle_at(&self, now: Instant) -> usize {
        let mut clients = self.clients.lock();
        let before = clients.len();
        clients.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= self.max_idle);
        before - clients.len()
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }
}

impl Sweep for ClientLimiterRegistry {
    fn name(&self) -> &'static str {
        self.name
    }

    fn sweep(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }
}

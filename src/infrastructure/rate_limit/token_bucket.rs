//! Token bucket limiter
//!
//! A bucket holds at most `burst` tokens and refills continuously at
//! `rate_per_second`. Each admitted request consumes one whole token.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Refill rate and capacity of a bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitProfile {
    /// Tokens added per second; fractional rates allow "N per minute" limits
    pub rate_per_second: f64,
    /// Bucket capacity
    pub burst: u32,
}

impl RateLimitProfile {
    pub fn new(rate_per_second: f64, burst: u32) -> Self {
        Self {
            rate_per_second,
            burst,
        }
    }

    /// Profile expressed as N requests per minute
    pub fn per_minute(requests: f64, burst: u32) -> Self {
        Self::new(requests / 60.0, burst)
    }

    /// Value advertised in `X-RateLimit-Limit`: the most requests a client
    /// can make back to back
    pub fn advertised_limit(&self) -> u32 {
        self.burst
    }

    pub fn is_valid(&self) -> bool {
        self.rate_per_second.is_finite() && self.rate_per_second >= 0.0
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    fn refill(&mut self, profile: &RateLimitProfile, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        let capacity = f64::from(profile.burst);

        self.tokens = (self.tokens + elapsed * profile.rate_per_second).min(capacity);
        if now > self.last_refill {
            self.last_refill = now;
        }
    }
}

/// Rate limiter for a single client
#[derive(Debug)]
pub struct TokenBucketLimiter {
    profile: RateLimitProfile,
    state: Mutex<BucketState>,
}

impl TokenBucketLimiter {
    /// Create a full bucket
    pub fn new(profile: RateLimitProfile) -> Self {
        Self::new_at(profile, Instant::now())
    }

    pub fn new_at(profile: RateLimitProfile, now: Instant) -> Self {
        Self {
            profile,
            state: Mutex::new(BucketState {
                tokens: f64::from(profile.burst),
                last_refill: now,
            }),
        }
    }

    pub fn profile(&self) -> &RateLimitProfile {
        &self.profile
    }

    /// Try to consume one token
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    pub fn allow_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock();
        state.refill(&self.profile, now);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens that would be available at `now`, without consuming any
    pub fn tokens_at(&self, now: Instant) -> f64 {
        let state = self.state.lock();
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        (state.tokens + elapsed * self.profile.rate_per_second).min(f64::from(self.profile.burst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_burst_then_reject() {
        let start = Instant::now();
        let limiter = TokenBucketLimiter::new_at(RateLimitProfile::new(1.0, 3), start);

        assert!(limiter.allow_at(start));
        assert!(limiter.allow_at(start));
        assert!(limiter.allow_at(start));
        assert!(!limiter.allow_at(start));
    }

    #[test]
    fn test_refill_over_time() {
        let start = Instant::now();
        let limiter = TokenBucketLimiter::new_at(RateLimitProfile::new(2.0, 2), start);

        assert!(limiter.allow_at(start));
        assert!(limiter.allow_at(start));
        assert!(!limiter.allow_at(start));

        // 2 tokens/s -> one token after 500ms
        let later = start + Duration::from_millis(500);
        assert!(limiter.allow_at(later));
        assert!(!limiter.allow_at(later));
    }

    #[test]
    fn test_refill_capped_at_burst() {
        let start = Instant::now();
        let limiter = TokenBucketLimiter::new_at(RateLimitProfile::new(10.0, 2), start);

        let much_later = start + Duration::from_secs(60);
        assert_eq!(limiter.tokens_at(much_later), 2.0);

        assert!(limiter.allow_at(much_later));
        assert!(limiter.allow_at(much_later));
        assert!(!limiter.allow_at(much_later));
    }

    #[test]
    fn test_per_minute_profile() {
        let start = Instant::now();
        let limiter = TokenBucketLimiter::new_at(RateLimitProfile::per_minute(1.0, 5), start);

        for _ in 0..5 {
            assert!(limiter.allow_at(start));
        }
        assert!(!limiter.allow_at(start));
        assert!(!limiter.allow_at(start + Duration::from_secs(30)));
        assert!(limiter.allow_at(start + Duration::from_secs(61)));
    }

    #[test]
    fn test_zero_burst_never_admits() {
        let start = Instant::now();
        let limiter = TokenBucketLimiter::new_at(RateLimitProfile::new(100.0, 0), start);

        assert!(!limiter.allow_at(start));
        assert!(!limiter.allow_at(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_zero_rate_never_refills() {
        let start = Instant::now();
        let limiter = TokenBucketLimiter::new_at(RateLimitProfile::new(0.0, 1), start);

        assert!(limiter.allow_at(start));
        assert!(!limiter.allow_at(start + Duration::from_secs(3600)));
    }

    #[test]
    fn test_earlier_instant_does_not_refill() {
        let start = Instant::now() + Duration::from_secs(5);
        let limiter = TokenBucketLimiter::new_at(RateLimitProfile::new(1.0, 1), start);

        assert!(limiter.allow_at(start));
        assert!(!limiter.allow_at(start - Duration::from_secs(2)));
    }

    #[test]
    fn test_advertised_limit() {
        assert_eq!(RateLimitProfile::new(100.0, 200).advertised_limit(), 200);
        assert_eq!(RateLimitProfile::per_minute(1.0, 5).advertised_limit(), 5);
        assert!(!RateLimitProfile::new(f64::NAN, 1).is_valid());
        assert!(!RateLimitProfile::new(-1.0, 1).is_valid());
    }
}

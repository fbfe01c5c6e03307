//! Per-client admission control
//!
//! Token buckets keyed by client, created on first use and evicted once idle.

mod registry;
mod token_bucket;

pub use registry::ClientLimiterRegistry;
pub use token_bucket::{RateLimitProfile, TokenBucketLimiter};

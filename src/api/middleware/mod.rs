//! API middleware components

pub mod admin;
pub mod auth;
pub mod client;
pub mod logging;
pub mod rate_limit;

pub use admin::require_admin;
pub use auth::{RequireUser, require_auth};
pub use client::client_key;
pub use logging::logging_middleware;
pub use rate_limit::{
    DEFAULT_LIMIT_MESSAGE, RateLimitState, STRICT_LIMIT_MESSAGE, rate_limit_middleware,
};

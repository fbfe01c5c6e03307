//! Application state for shared services

use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::auth::TokenAuthenticator;
use crate::infrastructure::rate_limit::ClientLimiterRegistry;
use crate::infrastructure::user::AuthService;

/// Services shared by every handler and middleware
#[derive(Debug, Clone)]
pub struct AppState {
    pub authenticator: Arc<TokenAuthenticator>,
    pub auth_service: Arc<AuthService>,
    /// Applied to every request
    pub default_limiter: Arc<ClientLimiterRegistry>,
    /// Applied to login and registration
    pub strict_limiter: Arc<ClientLimiterRegistry>,
    pub trust_forwarded_for: bool,
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl AppState {
    pub fn new(
        authenticator: Arc<TokenAuthenticator>,
        auth_service: Arc<AuthService>,
        default_limiter: Arc<ClientLimiterRegistry>,
        strict_limiter: Arc<ClientLimiterRegistry>,
    ) -> Self {
        Self {
            authenticator,
            auth_service,
            default_limiter,
            strict_limiter,
            trust_forwarded_for: false,
            request_timeout: Duration::from_secs(30),
            body_limit_bytes: 1024 * 1024,
        }
    }

    pub fn with_trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    pub fn with_request_limits(mut self, timeout: Duration, body_limit_bytes: usize) -> Self {
        self.request_timeout = timeout;
        self.body_limit_bytes = body_limit_bytes;
        self
    }
}

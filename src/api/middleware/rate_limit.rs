//! Per-client rate limiting middleware

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::client::client_key;
use crate::api::types::ApiError;
use crate::infrastructure::rate_limit::ClientLimiterRegistry;

pub const DEFAULT_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";
pub const STRICT_LIMIT_MESSAGE: &str = "Too many attempts. Please try again later.";

/// State for one instance of [`rate_limit_middleware`]
#[derive(Debug, Clone)]
pub struct RateLimitState {
    registry: Arc<ClientLimiterRegistry>,
    message: &'static str,
    trust_forwarded_for: bool,
}

impl RateLimitState {
    pub fn new(
        registry: Arc<ClientLimiterRegistry>,
        message: &'static str,
        trust_forwarded_for: bool,
    ) -> Self {
        Self {
            registry,
            message,
            trust_forwarded_for,
        }
    }
}

/// Admit the request if the client's bucket has a token, otherwise answer 429
pub async fn rate_limit_middleware(
    State(limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request, limit.trust_forwarded_for);

    if limit.registry.check(&client) {
        return next.run(request).await;
    }

    warn!(
        limiter = limit.registry.name(),
        client = %client,
        method = %request.method(),
        path = %request.uri().path(),
        "Rate limit exceeded"
    );

    ApiError::rate_limited(limit.message, limit.registry.profile().advertised_limit())
        .into_response()
}

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::admin;
use super::auth;
use super::health;
use super::middleware::{
    DEFAULT_LIMIT_MESSAGE, RateLimitState, STRICT_LIMIT_MESSAGE, logging_middleware,
    rate_limit_middleware, require_admin, require_auth,
};
use super::state::AppState;

/// Create the full router with application state.
///
/// Every route sits behind the default limiter. Credential endpoints add the
/// strict limiter, session endpoints require a valid token, and admin
/// endpoints additionally require the admin role. Handlers are bounded by
/// the configured request timeout (408) and body limit (413).
pub fn create_router(state: AppState) -> Router {
    let default_limit = RateLimitState::new(
        state.default_limiter.clone(),
        DEFAULT_LIMIT_MESSAGE,
        state.trust_forwarded_for,
    );
    let strict_limit = RateLimitState::new(
        state.strict_limiter.clone(),
        STRICT_LIMIT_MESSAGE,
        state.trust_forwarded_for,
    );

    let credentials = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route_layer(from_fn_with_state(strict_limit, rate_limit_middleware));

    let session = Router::new()
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    // Later layers run first: authentication, then the role check
    let admin_routes = Router::new()
        .route("/ping", get(admin::ping))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1/auth", credentials.merge(session))
        .nest("/api/v1/admin", admin_routes)
        .layer(DefaultBodyLimit::max(state.body_limit_bytes))
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(from_fn_with_state(default_limit, rate_limit_middleware))
        .layer(from_fn_with_state(state.trust_forwarded_for, logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

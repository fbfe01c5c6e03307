//! Request logging middleware

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

/// Log every completed request; failures (status >= 400) at warn level.
/// `TraceLayer` owns the request span, so no span is opened here.
///
/// The state is `server.trust_forwarded_for`, so the logged client matches
/// the key the rate limiter uses.
pub async fn logging_middleware(
    State(trust_forwarded_for): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = extract_path(&request);
    let client = super::client::client_key(&request, trust_forwarded_for);

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    if status.is_client_error() || status.is_server_error() {
        warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            client = %client,
            latency_ms,
            "Request failed"
        );
    } else {
        debug!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            latency_ms,
            "Request completed"
        );
    }

    response
}

fn extract_path(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

//! Bearer token authentication middleware

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::client::client_key;
use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::AuthenticatedIdentity;

/// Authenticate the request and attach its [`AuthenticatedIdentity`].
///
/// Rejections never reach the handler; they are answered here with the
/// matching 401 body.
pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match state.authenticator.authenticate(request.headers()).await {
        Ok(identity) => {
            debug!(user_id = %identity.user_id, role = identity.role.as_str(), "Request authenticated");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => {
            warn!(
                client = %client_key(&request, state.trust_forwarded_for),
                path = %request.uri().path(),
                reason = err.error_key(),
                "Authentication rejected"
            );
            ApiError::from(err).into_response()
        }
    }
}

/// Extractor for the identity attached by [`require_auth`]
#[derive(Debug, Clone)]
pub struct RequireUser(pub AuthenticatedIdentity);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .map(RequireUser)
            .ok_or_else(ApiError::unauthorized)
    }
}

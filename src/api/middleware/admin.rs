//! Admin-only route guard

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::types::ApiError;
use crate::domain::AuthenticatedIdentity;

/// Allow only admins through. Must run after `require_auth`.
pub async fn require_admin(request: Request, next: Next) -> Response {
    let Some(identity) = request.extensions().get::<AuthenticatedIdentity>() else {
        return ApiError::unauthorized().into_response();
    };

    if !identity.is_admin() {
        warn!(
            user_id = %identity.user_id,
            path = %request.uri().path(),
            "Admin access denied"
        );
        return ApiError::forbidden().into_response();
    }

    next.run(request).await
}

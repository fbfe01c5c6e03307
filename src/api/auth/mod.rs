//! Authentication API endpoints
//!
//! Registration and login issue bearer tokens; logout revokes the presented
//! token until its natural expiry.

use axum::{extract::State, http::HeaderMap, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{User, UserRole, UserState};
use crate::infrastructure::auth::bearer_token;
use crate::infrastructure::user::{RegisterRequest as NewAccount, Session};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// User response (safe to expose)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub state: UserState,
    pub role: UserRole,
    pub created_at: String,
}

impl UserResponse {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id().value(),
            username: user.username().to_string(),
            email: user.email().to_string(),
            state: user.state(),
            role: user.role(),
            created_at: user.created_at().to_rfc3339(),
        }
    }
}

/// Token plus the account it was issued for
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: String,
    pub user: UserResponse,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token.token,
            expires_at: session.token.expires_at.to_rfc3339(),
            user: UserResponse::from_user(&session.user),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let session = state
        .auth_service
        .register(NewAccount {
            username: request.username,
            email: request.email,
            password: request.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .auth_service
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(session.into()))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    RequireUser(identity): RequireUser,
) -> Result<Json<CurrentUserResponse>, ApiError> {
    let user = state.auth_service.current_user(identity.user_id).await?;

    Ok(Json(CurrentUserResponse {
        user: UserResponse::from_user(&user),
    }))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    RequireUser(identity): RequireUser,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, ApiError> {
    let token = bearer_token(&headers).ok_or_else(ApiError::unauthorized)?;

    state.auth_service.logout(token, identity.user_id).await?;

    Ok(Json(LogoutResponse {
        message: "Successfully logged out".to_string(),
    }))
}

//! Admin API endpoints

use serde::Serialize;

use crate::api::middleware::RequireUser;
use crate::api::types::Json;

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub user_id: u64,
}

/// GET /api/v1/admin/ping
pub async fn ping(RequireUser(identity): RequireUser) -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        user_id: identity.user_id.value(),
    })
}

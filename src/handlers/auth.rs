//! Organizer login and logout.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub password: String,
}

/// Newly issued session
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Expiry (RFC 3339)
    pub expires_at: String,
}

/// Exchange the admin password for a session token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 400, description = "Malformed body", body = ApiError),
        (status = 401, description = "Invalid credentials", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    let issued = state.session_gate().login(&request.password).await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_at: issued.expires_at.to_rfc3339(),
    }))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Session missing or expired", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    admin: AdminAuth,
) -> Result<StatusCode, ApiError> {
    state.session_gate().logout(admin.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

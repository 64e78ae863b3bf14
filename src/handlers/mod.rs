//! # API Handlers
//!
//! HTTP endpoint handlers for the roster API.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db;
use crate::error::ApiError;
use crate::models::{Role, RoleCategory, ServiceInfo};
use crate::server::AppState;

pub mod auth;
pub mod queue;
pub mod registration;
pub mod selection;
pub mod settings;
pub mod types;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Health status payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}

/// Liveness plus database reachability
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service and database are reachable", body = HealthResponse),
        (status = 503, description = "Database unavailable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn healthz(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    db::health_check(&state.db).await.map_err(|err| {
        tracing::error!(error = %err, "Health check failed");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "PERSISTENCE_ERROR",
            "Database is unreachable",
        )
        .with_retry_after(5)
    })?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

/// One entry of the role catalogue
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleInfo {
    pub role: Role,
    pub category: RoleCategory,
    /// True for the role resolved by random draw
    pub wildcard: bool,
}

/// Lists every role a player can register for, in sign-up form order
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    responses(
        (status = 200, description = "Role catalogue", body = [RoleInfo])
    ),
    tag = "registration"
)]
pub async fn list_roles() -> Json<Vec<RoleInfo>> {
    Json(
        Role::ALL
            .iter()
            .map(|role| RoleInfo {
                role: *role,
                category: role.category(),
                wildcard: role.is_wildcard(),
            })
            .collect(),
    )
}

//! MOR priority list handlers.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AdminAuth;
use crate::error::{ApiError, RosterError};
use crate::handlers::types::{ConfirmQuery, DeletedResponse, NotificationNotice, QueueEntryView};
use crate::repositories::QueueEntryRepository;
use crate::server::AppState;

/// Result of removing one entry
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemovedEntryResponse {
    pub entry: QueueEntryView,
    pub notification: NotificationNotice,
}

/// List the MOR priority list, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/queue",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Queue entries", body = [QueueEntryView]),
        (status = 401, description = "Session missing or expired", body = ApiError),
        (status = 503, description = "Store unavailable; retry", body = ApiError)
    ),
    tag = "queue"
)]
pub async fn list_queue(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<Vec<QueueEntryView>>, ApiError> {
    let entries = QueueEntryRepository::new(std::sync::Arc::new(state.db.clone()))
        .list()
        .await
        .map_err(RosterError::from)?;

    Ok(Json(entries.into_iter().map(QueueEntryView::from).collect()))
}

/// Remove one entry; the participant's status is not changed
#[utoipa::path(
    delete,
    path = "/api/v1/queue/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Queue entry id")),
    responses(
        (status = 200, description = "Entry removed", body = RemovedEntryResponse),
        (status = 401, description = "Session missing or expired", body = ApiError),
        (status = 404, description = "Unknown queue entry", body = ApiError),
        (status = 503, description = "Store unavailable; retry", body = ApiError)
    ),
    tag = "queue"
)]
pub async fn remove_queue_entry(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<RemovedEntryResponse>, ApiError> {
    let (entry, delivery) = state.selection().remove_from_queue(id).await?;

    Ok(Json(RemovedEntryResponse {
        entry: entry.into(),
        notification: NotificationNotice::from(&delivery),
    }))
}

/// Delete every MOR entry
#[utoipa::path(
    delete,
    path = "/api/v1/queue",
    security(("bearer_auth" = [])),
    params(ConfirmQuery),
    responses(
        (status = 200, description = "Queue cleared", body = DeletedResponse),
        (status = 400, description = "Missing confirm=true", body = ApiError),
        (status = 401, description = "Session missing or expired", body = ApiError),
        (status = 503, description = "Store unavailable; retry", body = ApiError)
    ),
    tag = "queue"
)]
pub async fn clear_queue(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<Json<DeletedResponse>, ApiError> {
    confirm.require()?;
    let deleted = state.settings().clear_queue().await?;
    Ok(Json(DeletedResponse { deleted }))
}

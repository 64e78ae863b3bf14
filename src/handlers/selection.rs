//! # Selection Handlers
//!
//! Organizer dashboard and participant state transitions. All routes here sit
//! behind the session gate.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::flows::{Board, Transition};
use crate::handlers::types::{
    ConfirmQuery, DeletedResponse, NotificationNotice, ParticipantView, QueueEntryView,
};
use crate::models::participant::Model as ParticipantModel;
use crate::models::{Role, RoleCategory};
use crate::server::AppState;

/// Participants of one role, strongest first
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleGroup {
    pub role: Role,
    pub category: RoleCategory,
    pub wildcard: bool,
    pub participants: Vec<ParticipantView>,
}

/// Organizer dashboard
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BoardResponse {
    /// Registrations in the current session
    pub total: usize,
    /// Only roles with at least one registration, in sign-up form order
    pub groups: Vec<RoleGroup>,
    pub selected: Vec<ParticipantView>,
    pub queued: Vec<ParticipantView>,
    /// MOR priority list, oldest first
    pub queue: Vec<QueueEntryView>,
    /// Priority entries earned in earlier sessions
    pub carried_over: usize,
}

impl From<Board> for BoardResponse {
    fn from(board: Board) -> Self {
        let views = |list: Vec<ParticipantModel>| -> Vec<ParticipantView> {
            list.into_iter().map(ParticipantView::from).collect()
        };
        Self {
            total: board.total,
            groups: board
                .by_role
                .into_iter()
                .map(|(role, participants)| RoleGroup {
                    role,
                    category: role.category(),
                    wildcard: role.is_wildcard(),
                    participants: views(participants),
                })
                .collect(),
            selected: views(board.selected),
            queued: views(board.queued),
            queue: board.queue.into_iter().map(QueueEntryView::from).collect(),
            carried_over: board.carried_over,
        }
    }
}

/// Outcome of a state transition
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransitionResponse {
    pub participant: ParticipantView,
    /// Entry created by a defer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_entry: Option<QueueEntryView>,
    /// Entry consumed by a select
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_entry: Option<QueueEntryView>,
    pub notification: NotificationNotice,
}

impl From<Transition> for TransitionResponse {
    fn from(transition: Transition) -> Self {
        Self {
            notification: NotificationNotice::from(transition.notification.as_ref()),
            participant: ParticipantView::from(transition.participant),
            created_entry: transition.created_entry.map(QueueEntryView::from),
            removed_entry: transition.removed_entry.map(QueueEntryView::from),
        }
    }
}

/// Grouped view of the current session
#[utoipa::path(
    get,
    path = "/api/v1/board",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard snapshot", body = BoardResponse),
        (status = 401, description = "Session missing or expired", body = ApiError),
        (status = 503, description = "Store unavailable; retry", body = ApiError)
    ),
    tag = "selection"
)]
pub async fn get_board(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<BoardResponse>, ApiError> {
    let board = state.selection().board().await?;
    Ok(Json(BoardResponse::from(board)))
}

/// Fetch one participant
#[utoipa::path(
    get,
    path = "/api/v1/participants/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Participant id")),
    responses(
        (status = 200, description = "Participant", body = ParticipantView),
        (status = 401, description = "Session missing or expired", body = ApiError),
        (status = 404, description = "Unknown participant", body = ApiError),
        (status = 503, description = "Store unavailable; retry", body = ApiError)
    ),
    tag = "selection"
)]
pub async fn get_participant(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<ParticipantView>, ApiError> {
    let participant = state.selection().participant(id).await?;
    Ok(Json(ParticipantView::from(participant)))
}

/// Select a participant, consuming any MOR priority they hold
#[utoipa::path(
    post,
    path = "/api/v1/participants/{id}/select",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Participant id")),
    responses(
        (status = 200, description = "Participant selected", body = TransitionResponse),
        (status = 401, description = "Session missing or expired", body = ApiError),
        (status = 404, description = "Unknown participant", body = ApiError),
        (status = 409, description = "Participant already selected", body = ApiError),
        (status = 503, description = "Store unavailable; retry", body = ApiError)
    ),
    tag = "selection"
)]
pub async fn select_participant(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let transition = state.selection().select(id).await?;
    Ok(Json(transition.into()))
}

/// Defer a pending participant to the MOR priority list
#[utoipa::path(
    post,
    path = "/api/v1/participants/{id}/defer",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Participant id")),
    responses(
        (status = 200, description = "Participant queued", body = TransitionResponse),
        (status = 401, description = "Session missing or expired", body = ApiError),
        (status = 404, description = "Unknown participant", body = ApiError),
        (status = 409, description = "Participant is not pending", body = ApiError),
        (status = 503, description = "Store unavailable; retry", body = ApiError)
    ),
    tag = "selection"
)]
pub async fn defer_participant(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let transition = state.selection().defer_to_queue(id).await?;
    Ok(Json(transition.into()))
}

/// Return a selected participant to pending
#[utoipa::path(
    post,
    path = "/api/v1/participants/{id}/deselect",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Participant id")),
    responses(
        (status = 200, description = "Participant back to pending", body = TransitionResponse),
        (status = 401, description = "Session missing or expired", body = ApiError),
        (status = 404, description = "Unknown participant", body = ApiError),
        (status = 409, description = "Participant is not selected", body = ApiError),
        (status = 503, description = "Store unavailable; retry", body = ApiError)
    ),
    tag = "selection"
)]
pub async fn deselect_participant(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let transition = state.selection().deselect(id).await?;
    Ok(Json(transition.into()))
}

/// Select a random pending participant of the wildcard role
#[utoipa::path(
    post,
    path = "/api/v1/roles/wildcard/draw",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Drawn participant selected", body = TransitionResponse),
        (status = 401, description = "Session missing or expired", body = ApiError),
        (status = 409, description = "No pending wildcard entrant left", body = ApiError),
        (status = 503, description = "Store unavailable; retry", body = ApiError)
    ),
    tag = "selection"
)]
pub async fn draw_wildcard(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<TransitionResponse>, ApiError> {
    let transition = state.selection().draw_wildcard().await?;
    Ok(Json(transition.into()))
}

/// Start a new session: delete every participant, keep the MOR list
#[utoipa::path(
    delete,
    path = "/api/v1/participants",
    security(("bearer_auth" = [])),
    params(ConfirmQuery),
    responses(
        (status = 200, description = "Participants deleted", body = DeletedResponse),
        (status = 400, description = "Missing confirm=true", body = ApiError),
        (status = 401, description = "Session missing or expired", body = ApiError),
        (status = 503, description = "Store unavailable; retry", body = ApiError)
    ),
    tag = "selection"
)]
pub async fn clear_participants(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<Json<DeletedResponse>, ApiError> {
    confirm.require()?;
    let deleted = state.selection().clear_session().await?;
    Ok(Json(DeletedResponse { deleted }))
}

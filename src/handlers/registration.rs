//! # Registration Handlers
//!
//! Public sign-up endpoint.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::LOCATION},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::flows::Submission;
use crate::handlers::types::ParticipantView;
use crate::server::AppState;

/// Sign-up form payload
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterParticipantRequest {
    /// In-game display name (required)
    #[schema(example = "Aria")]
    pub player_name: String,
    /// Role label from `GET /api/v1/roles` (required)
    #[schema(example = "Healer")]
    pub role: String,
    /// Power rating, a non-negative integer (required)
    #[schema(example = 1500)]
    pub ip: Option<i64>,
}

/// Register a participant for the current session
#[utoipa::path(
    post,
    path = "/api/v1/participants",
    request_body = RegisterParticipantRequest,
    responses(
        (status = 201, description = "Participant registered with status pending", body = ParticipantView, headers(
            ("Location", description = "URL of the created participant"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 503, description = "Store unavailable; retry", body = ApiError)
    ),
    tag = "registration"
)]
pub async fn register_participant(
    State(state): State<AppState>,
    payload: Result<Json<RegisterParticipantRequest>, JsonRejection>,
) -> Result<(StatusCode, [(axum::http::HeaderName, String); 1], Json<ParticipantView>), ApiError> {
    let Json(request) = payload?;

    let participant = state
        .registration()
        .register(Submission {
            player_name: request.player_name,
            role: request.role,
            ip: request.ip,
        })
        .await?;

    let location = format!("/api/v1/participants/{}", participant.id);
    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(ParticipantView::from(participant)),
    ))
}

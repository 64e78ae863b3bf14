//! # Settings Handlers
//!
//! Chat webhook configuration and connectivity test.

use axum::{
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::handlers::types::NotificationNotice;
use crate::server::AppState;

/// Stored webhook configuration
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookSettingResponse {
    /// Empty when notifications are disabled
    #[schema(example = "https://discord.com/api/webhooks/123/abc")]
    pub url: String,
    pub enabled: bool,
    /// Last write (RFC 3339), absent if never written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// New webhook URL; empty disables notifications
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateWebhookRequest {
    pub url: String,
}

/// Optional URL to test instead of the stored one
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct TestWebhookRequest {
    pub url: Option<String>,
}

/// Read the configured webhook URL
#[utoipa::path(
    get,
    path = "/api/v1/settings/webhook",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Webhook setting", body = WebhookSettingResponse),
        (status = 401, description = "Session missing or expired", body = ApiError),
        (status = 503, description = "Store unavailable; retry", body = ApiError)
    ),
    tag = "settings"
)]
pub async fn get_webhook(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<WebhookSettingResponse>, ApiError> {
    let response = match state.settings().webhook_setting().await? {
        Some(row) => WebhookSettingResponse {
            enabled: !row.value.is_empty(),
            url: row.value,
            updated_at: Some(row.updated_at.to_rfc3339()),
        },
        None => WebhookSettingResponse {
            url: String::new(),
            enabled: false,
            updated_at: None,
        },
    };
    Ok(Json(response))
}

/// Store the webhook URL
#[utoipa::path(
    put,
    path = "/api/v1/settings/webhook",
    security(("bearer_auth" = [])),
    request_body = UpdateWebhookRequest,
    responses(
        (status = 200, description = "Webhook saved", body = WebhookSettingResponse),
        (status = 400, description = "URL does not match the webhook pattern", body = ApiError),
        (status = 401, description = "Session missing or expired", body = ApiError),
        (status = 503, description = "Store unavailable; retry", body = ApiError)
    ),
    tag = "settings"
)]
pub async fn put_webhook(
    State(state): State<AppState>,
    _admin: AdminAuth,
    payload: Result<Json<UpdateWebhookRequest>, JsonRejection>,
) -> Result<Json<WebhookSettingResponse>, ApiError> {
    let Json(request) = payload?;
    let row = state.settings().set_webhook(&request.url).await?;

    Ok(Json(WebhookSettingResponse {
        enabled: !row.value.is_empty(),
        url: row.value,
        updated_at: Some(row.updated_at.to_rfc3339()),
    }))
}

/// Send a test message to the given or stored webhook
#[utoipa::path(
    post,
    path = "/api/v1/settings/webhook/test",
    security(("bearer_auth" = [])),
    request_body = TestWebhookRequest,
    responses(
        (status = 200, description = "Test outcome; delivery failures are reported, not raised", body = NotificationNotice),
        (status = 400, description = "URL does not match the webhook pattern", body = ApiError),
        (status = 401, description = "Session missing or expired", body = ApiError)
    ),
    tag = "settings"
)]
pub async fn test_webhook(
    State(state): State<AppState>,
    _admin: AdminAuth,
    body: Bytes,
) -> Result<Json<NotificationNotice>, ApiError> {
    // The body is optional; an empty one tests the stored URL.
    let request: TestWebhookRequest = if body.is_empty() {
        TestWebhookRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|err| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                &format!("Invalid JSON: {}", err),
            )
        })?
    };
    let delivery = state
        .settings()
        .test_webhook(request.url.as_deref())
        .await?;

    Ok(Json(NotificationNotice::from(&delivery)))
}

//! # Error Handling
//!
//! This module provides unified error handling for the roster service,
//! implementing a consistent problem+json response format with trace ID propagation.

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::telemetry;

/// Seconds a client should wait before repeating an action that failed on persistence
const PERSISTENCE_RETRY_AFTER_SECONDS: u64 = 2;

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Suggested retry delay in seconds (optional)
    pub retry_after: Option<u64>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            retry_after: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Set retry after delay
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// Extract current trace ID from the active request (falls back to generated correlation ID)
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| Some(format!("corr-{}", &Uuid::new_v4().to_string()[..8]).into_boxed_str()))
    }
}

pub(crate) fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    db_error
        .code()
        .is_some_and(|code| code == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code.as_ref()))
}

/// Errors produced by the repository layer
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("not found: {0}")]
    NotFound(String),
}

impl RepositoryError {
    pub fn database_error(err: sea_orm::DbErr) -> Self {
        Self::Database(err)
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }
}

/// Outcome taxonomy of the registration, selection and settings flows.
///
/// Notification failures never fail an operation; they are reported as a
/// notice instead.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: serde_json::Value,
    },
    #[error("{0} was not found")]
    NotFound(String),
    #[error("{player_name} is already selected")]
    AlreadySelected { player_name: String },
    #[error("cannot {action} a participant whose status is {from}")]
    InvalidTransition {
        action: &'static str,
        from: crate::models::ParticipantStatus,
    },
    #[error("every {role} entrant is already selected or queued")]
    NothingAvailable { role: crate::models::Role },
    #[error("session missing or expired; log in again")]
    AuthExpired,
    #[error("persistence failure: {0}")]
    Persistence(#[source] sea_orm::DbErr),
}

impl RosterError {
    pub fn validation<S: Into<String>>(message: S, field_errors: serde_json::Value) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors,
        }
    }
}

impl From<RepositoryError> for RosterError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(err) => RosterError::Persistence(err),
            RepositoryError::NotFound(what) => RosterError::NotFound(what),
        }
    }
}

impl From<sea_orm::DbErr> for RosterError {
    fn from(error: sea_orm::DbErr) -> Self {
        RosterError::Persistence(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        if let Some(retry_after) = self.retry_after
            && let Ok(header_value) = HeaderValue::from_str(&retry_after.to_string())
        {
            headers.insert("retry-after", header_value);
        }

        (self.status, headers, axum::Json(self)).into_response()
    }
}

impl IntoResponse for RosterError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

// Error mappers for common sources

impl From<RosterError> for ApiError {
    fn from(error: RosterError) -> Self {
        match error {
            RosterError::Validation {
                message,
                field_errors,
            } if field_errors.is_null() => {
                ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
            }
            RosterError::Validation {
                message,
                field_errors,
            } => validation_error(&message, field_errors),
            RosterError::NotFound(_) => ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &error.to_string(),
            ),
            RosterError::AlreadySelected { .. } => ApiError::new(
                StatusCode::CONFLICT,
                "ALREADY_SELECTED",
                &error.to_string(),
            ),
            RosterError::InvalidTransition { action, from } => ApiError::new(
                StatusCode::CONFLICT,
                "INVALID_TRANSITION",
                &error.to_string(),
            )
            .with_details(serde_json::json!({ "action": action, "status": from })),
            RosterError::NothingAvailable { role } => ApiError::new(
                StatusCode::CONFLICT,
                "NOTHING_AVAILABLE",
                &error.to_string(),
            )
            .with_details(serde_json::json!({ "role": role })),
            RosterError::AuthExpired => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "AUTH_EXPIRED",
                &error.to_string(),
            ),
            RosterError::Persistence(db_error) => ApiError::from(db_error),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:?}", error);

        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "An internal error occurred",
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation detected");
            return Self::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");
        }

        match error {
            sea_orm::DbErr::RecordNotFound(record) => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Record not found: {}", record),
            ),
            _ => {
                tracing::error!("Database error: {:?}", error);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PERSISTENCE_ERROR",
                    "The roster store could not complete the request; please try again",
                )
                .with_retry_after(PERSISTENCE_RETRY_AFTER_SECONDS)
            }
        }
    }
}

/// Create an unauthorized error (401)
pub fn unauthorized(message: Option<&str>) -> ApiError {
    let msg = message.unwrap_or("Authentication required");
    ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParticipantStatus, Role};
    use serde_json::json;

    #[test]
    fn test_api_error_basic() {
        let error = ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "Test error message",
        );

        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(error.message, Box::from("Test error message"));
        assert_eq!(error.details, None);
        assert_eq!(error.retry_after, None);
    }

    #[test]
    fn test_content_type_header() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "Test error");

        let response = error.into_response();

        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn test_trace_id_generation() {
        let error = ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "Test error",
        );

        assert!(error.trace_id.is_some());
        let trace_id = error.trace_id.unwrap();
        assert!(trace_id.starts_with("corr-"));
        assert_eq!(trace_id.len(), 13); // "corr-" + 8 chars
    }

    #[test]
    fn test_persistence_error_is_retryable() {
        let db_error = sea_orm::DbErr::Custom("connection reset".to_string());
        let api_error: ApiError = RosterError::Persistence(db_error).into();

        assert_eq!(api_error.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api_error.code, Box::from("PERSISTENCE_ERROR"));
        assert_eq!(api_error.retry_after, Some(PERSISTENCE_RETRY_AFTER_SECONDS));

        let response = api_error.into_response();
        assert_eq!(response.headers().get("retry-after").unwrap(), "2");
    }

    #[test]
    fn test_already_selected_maps_to_conflict() {
        let api_error: ApiError = RosterError::AlreadySelected {
            player_name: "Aria".to_string(),
        }
        .into();

        assert_eq!(api_error.status, StatusCode::CONFLICT);
        assert_eq!(api_error.code, Box::from("ALREADY_SELECTED"));
        assert!(api_error.message.contains("Aria"));
    }

    #[test]
    fn test_invalid_transition_details() {
        let api_error: ApiError = RosterError::InvalidTransition {
            action: "deselect",
            from: ParticipantStatus::Pending,
        }
        .into();

        assert_eq!(api_error.code, Box::from("INVALID_TRANSITION"));
        let details = api_error.details.unwrap();
        assert_eq!(details["action"], "deselect");
        assert_eq!(details["status"], "pending");
    }

    #[test]
    fn test_nothing_available_names_role() {
        let api_error: ApiError = RosterError::NothingAvailable {
            role: Role::Roletroll,
        }
        .into();

        assert_eq!(api_error.status, StatusCode::CONFLICT);
        assert_eq!(api_error.code, Box::from("NOTHING_AVAILABLE"));
        assert_eq!(api_error.details.unwrap()["role"], "Roletroll");
    }

    #[test]
    fn test_auth_expired_maps_to_401() {
        let api_error: ApiError = RosterError::AuthExpired.into();
        assert_eq!(api_error.status, StatusCode::UNAUTHORIZED);
        assert_eq!(api_error.code, Box::from("AUTH_EXPIRED"));
    }

    #[test]
    fn test_validation_error_with_details() {
        let field_errors = json!({
            "player_name": "Player name is required",
        });

        let api_error: ApiError =
            RosterError::validation("Validation failed", field_errors.clone()).into();

        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(api_error.details, Some(Box::new(field_errors)));
    }

    #[test]
    fn test_repository_not_found_mapping() {
        let error: RosterError = RepositoryError::not_found("participant 42").into();
        let api_error: ApiError = error.into();

        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert!(api_error.message.contains("participant 42"));
    }

    #[test]
    fn test_from_anyhow() {
        let api_error: ApiError = anyhow::anyhow!("Something went wrong").into();

        assert_eq!(api_error.code, Box::from("INTERNAL_SERVER_ERROR"));
        assert_eq!(api_error.message, Box::from("An internal error occurred"));
    }
}

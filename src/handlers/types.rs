//! # Common API Types
//!
//! Response shapes shared by the roster handlers.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::models::participant::Model as ParticipantModel;
use crate::models::queue_entry::Model as QueueEntryModel;
use crate::models::{ParticipantStatus, Role};
use crate::notifier::Delivery;

/// A registered participant
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipantView {
    #[schema(value_type = String, example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "Aria")]
    pub player_name: String,
    pub role: Role,
    /// Power rating
    #[schema(example = 1500)]
    pub ip: i64,
    pub status: ParticipantStatus,
    /// Registration time (RFC 3339)
    pub created_at: String,
}

impl From<ParticipantModel> for ParticipantView {
    fn from(model: ParticipantModel) -> Self {
        Self {
            id: model.id,
            player_name: model.player_name,
            role: model.role,
            ip: model.ip,
            status: model.status,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// A MOR priority entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueueEntryView {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub participant_id: Uuid,
    pub player_name: String,
    /// Reference of the delivered "queued" announcement
    pub notification_ref: Option<String>,
    pub created_at: String,
}

impl From<QueueEntryModel> for QueueEntryView {
    fn from(model: QueueEntryModel) -> Self {
        Self {
            id: model.id,
            participant_id: model.participant_id,
            player_name: model.player_name,
            notification_ref: model.notification_ref,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Informational outcome of a chat notification. Never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationNotice {
    /// Whether a webhook request was made
    pub attempted: bool,
    pub delivered: bool,
    /// Message to show the organizer when delivery did not happen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl NotificationNotice {
    pub fn none() -> Self {
        Self {
            attempted: false,
            delivered: false,
            notice: None,
        }
    }
}

impl From<&Delivery> for NotificationNotice {
    fn from(delivery: &Delivery) -> Self {
        match delivery {
            Delivery::Delivered { .. } => Self {
                attempted: true,
                delivered: true,
                notice: None,
            },
            Delivery::NotConfigured => Self {
                attempted: false,
                delivered: false,
                notice: Some(
                    "No webhook is configured; the change was saved without a chat announcement"
                        .to_string(),
                ),
            },
            Delivery::Failed { reason } => Self {
                attempted: true,
                delivered: false,
                notice: Some(format!(
                    "The change was saved but the chat announcement failed: {reason}"
                )),
            },
        }
    }
}

impl From<Option<&Delivery>> for NotificationNotice {
    fn from(delivery: Option<&Delivery>) -> Self {
        delivery.map(Self::from).unwrap_or_else(Self::none)
    }
}

/// Explicit confirmation flag for irreversible bulk deletes
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ConfirmQuery {
    /// Must be `true`
    pub confirm: Option<bool>,
}

impl ConfirmQuery {
    pub fn require(&self) -> Result<(), ApiError> {
        if self.confirm == Some(true) {
            return Ok(());
        }
        Err(validation_error(
            "This action is irreversible and requires confirm=true",
            serde_json::json!({ "confirm": "must be true" }),
        ))
    }
}

/// Number of records removed by a bulk delete
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedResponse {
    #[schema(example = 12)]
    pub deleted: u64,
}

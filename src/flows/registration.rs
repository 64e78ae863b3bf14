//! Registration of new participants.
//!
//! Submissions are validated server-side before anything is written; a
//! successful registration is a single insert with status `pending`.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::error::RosterError;
use crate::models::Role;
use crate::models::participant::Model as ParticipantModel;
use crate::repositories::{NewParticipant, ParticipantRepository};

const MAX_PLAYER_NAME_CHARS: usize = 64;

/// Raw sign-up form values
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub player_name: String,
    pub role: String,
    pub ip: Option<i64>,
}

impl Submission {
    /// Checks every field and reports all problems at once, keyed by field name.
    pub fn validate(&self) -> Result<NewParticipant, RosterError> {
        let mut field_errors = Map::new();

        let player_name = self.player_name.trim();
        if player_name.is_empty() {
            field_errors.insert("player_name".into(), json!("Player name is required"));
        } else if player_name.chars().count() > MAX_PLAYER_NAME_CHARS {
            field_errors.insert(
                "player_name".into(),
                json!(format!("Player name must be at most {MAX_PLAYER_NAME_CHARS} characters")),
            );
        }

        let role = match self.role.trim() {
            "" => {
                field_errors.insert("role".into(), json!("Role is required"));
                None
            }
            label => match label.parse::<Role>() {
                Ok(role) => Some(role),
                Err(err) => {
                    field_errors.insert("role".into(), json!(err.to_string()));
                    None
                }
            },
        };

        match self.ip {
            None => {
                field_errors.insert("ip".into(), json!("Power rating is required"));
            }
            Some(ip) if ip < 0 => {
                field_errors.insert("ip".into(), json!("Power rating must not be negative"));
            }
            Some(_) => {}
        }

        match (role, self.ip) {
            (Some(role), Some(ip)) if field_errors.is_empty() => Ok(NewParticipant {
                player_name: player_name.to_string(),
                role,
                ip,
            }),
            _ => Err(RosterError::validation(
                "Registration is incomplete or invalid",
                Value::Object(field_errors),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationService {
    participants: ParticipantRepository,
}

impl RegistrationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            participants: ParticipantRepository::new(db),
        }
    }

    /// Validates the submission and stores a pending participant.
    pub async fn register(&self, submission: Submission) -> Result<ParticipantModel, RosterError> {
        let new = submission.validate()?;
        let participant = self.participants.create(new).await?;

        info!(
            participant_id = %participant.id,
            role = %participant.role,
            "Registered participant"
        );
        Ok(participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(name: &str, role: &str, ip: Option<i64>) -> Submission {
        Submission {
            player_name: name.to_string(),
            role: role.to_string(),
            ip,
        }
    }

    #[test]
    fn accepts_complete_submission() {
        let new = submission("  Aria ", "Healer", Some(1500)).validate().unwrap();

        assert_eq!(new.player_name, "Aria");
        assert_eq!(new.role, Role::Healer);
        assert_eq!(new.ip, 1500);
    }

    #[test]
    fn zero_rating_is_allowed() {
        assert!(submission("Aria", "Scout", Some(0)).validate().is_ok());
    }

    #[test]
    fn reports_every_invalid_field() {
        let err = submission(" ", "Bard", Some(-1)).validate().unwrap_err();

        match err {
            RosterError::Validation { field_errors, .. } => {
                assert!(field_errors.get("player_name").is_some());
                assert!(field_errors.get("role").is_some());
                assert!(field_errors.get("ip").is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_rating_is_rejected() {
        let err = submission("Aria", "Healer", None).validate().unwrap_err();
        assert!(matches!(err, RosterError::Validation { .. }));
    }

    #[test]
    fn overlong_name_is_rejected() {
        let name = "x".repeat(MAX_PLAYER_NAME_CHARS + 1);
        assert!(submission(&name, "Healer", Some(1)).validate().is_err());
    }
}

//! # Participant Repository
//!
//! CRUD operations over the `participants` table. Status writes are also
//! exposed as connection-generic functions so selection transitions can run
//! them inside a transaction.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::participant::{
    self, ActiveModel as ParticipantActiveModel, Model as ParticipantModel,
};
use crate::models::{Participant, ParticipantStatus, Role};

/// Fields accepted when registering a participant
#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub player_name: String,
    pub role: Role,
    pub ip: i64,
}

#[derive(Debug, Clone)]
pub struct ParticipantRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl ParticipantRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Inserts a new participant with status `pending`
    pub async fn create(&self, new: NewParticipant) -> Result<ParticipantModel, RepositoryError> {
        let participant = ParticipantActiveModel {
            id: Set(Uuid::new_v4()),
            player_name: Set(new.player_name),
            role: Set(new.role),
            ip: Set(new.ip),
            status: Set(ParticipantStatus::Pending),
            created_at: Set(Utc::now().into()),
        };

        participant
            .insert(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Lists every participant, newest registration first
    pub async fn list_all(&self) -> Result<Vec<ParticipantModel>, RepositoryError> {
        Participant::find()
            .order_by_desc(participant::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Lists the participants registered for one role, newest first
    pub async fn list_by_role(&self, role: Role) -> Result<Vec<ParticipantModel>, RepositoryError> {
        Participant::find()
            .filter(participant::Column::Role.eq(role))
            .order_by_desc(participant::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ParticipantModel>, RepositoryError> {
        find_by_id_in(self.db.as_ref(), id).await
    }

    /// Persists a new status for the participant with the given id
    pub async fn update_status(
        &self,
        id: Uuid,
        status: ParticipantStatus,
    ) -> Result<ParticipantModel, RepositoryError> {
        let participant = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found(format!("participant {id}")))?;

        set_status_in(self.db.as_ref(), participant, status).await
    }

    /// Deletes every participant. Queue entries are untouched.
    pub async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = Participant::delete_many()
            .exec(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(result.rows_affected)
    }
}

pub async fn find_by_id_in<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<Option<ParticipantModel>, RepositoryError> {
    Participant::find_by_id(id)
        .one(conn)
        .await
        .map_err(RepositoryError::database_error)
}

/// Writes `status` onto an already loaded participant.
pub async fn set_status_in<C: ConnectionTrait>(
    conn: &C,
    participant: ParticipantModel,
    status: ParticipantStatus,
) -> Result<ParticipantModel, RepositoryError> {
    let mut active = participant.into_active_model();
    active.status = Set(status);
    active
        .update(conn)
        .await
        .map_err(RepositoryError::database_error)
}

//! # MOR Queue Repository
//!
//! Operations over the `mor_list` table. Entries are keyed by participant id
//! and outlive the participant rows they were created for.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::QueueEntry;
use crate::models::queue_entry::{self, ActiveModel as QueueEntryActiveModel, Model as QueueEntryModel};

/// Repository for MOR queue database operations
#[derive(Debug, Clone)]
pub struct QueueEntryRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl QueueEntryRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists queue entries in priority order (oldest first)
    pub async fn list(&self) -> Result<Vec<QueueEntryModel>, RepositoryError> {
        QueueEntry::find()
            .order_by_asc(queue_entry::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn count(&self) -> Result<u64, RepositoryError> {
        QueueEntry::find()
            .count(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_participant(
        &self,
        participant_id: Uuid,
    ) -> Result<Option<QueueEntryModel>, RepositoryError> {
        find_by_participant_in(self.db.as_ref(), participant_id).await
    }

    /// Removes one entry by its own id and returns it
    pub async fn delete_by_id(&self, id: Uuid) -> Result<QueueEntryModel, RepositoryError> {
        let entry = QueueEntry::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found(format!("queue entry {id}")))?;

        entry
            .clone()
            .delete(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(entry)
    }

    /// Deletes every queue entry
    pub async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = QueueEntry::delete_many()
            .exec(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(result.rows_affected)
    }

    /// Records the reference of a delivered "queued" announcement
    pub async fn set_notification_ref(
        &self,
        id: Uuid,
        reference: Option<String>,
    ) -> Result<(), RepositoryError> {
        let result = QueueEntry::update_many()
            .col_expr(queue_entry::Column::NotificationRef, Expr::value(reference))
            .filter(queue_entry::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found(format!("queue entry {id}")));
        }
        Ok(())
    }
}

pub async fn find_by_participant_in<C: ConnectionTrait>(
    conn: &C,
    participant_id: Uuid,
) -> Result<Option<QueueEntryModel>, RepositoryError> {
    QueueEntry::find()
        .filter(queue_entry::Column::ParticipantId.eq(participant_id))
        .one(conn)
        .await
        .map_err(RepositoryError::database_error)
}

/// Inserts a queue entry without a notification reference.
pub async fn create_in<C: ConnectionTrait>(
    conn: &C,
    participant_id: Uuid,
    player_name: &str,
) -> Result<QueueEntryModel, RepositoryError> {
    let entry = QueueEntryActiveModel {
        id: Set(Uuid::new_v4()),
        participant_id: Set(participant_id),
        player_name: Set(player_name.to_string()),
        notification_ref: Set(None),
        created_at: Set(Utc::now().into()),
    };

    entry
        .insert(conn)
        .await
        .map_err(RepositoryError::database_error)
}

/// Deletes the entry held by `participant_id`, returning it when one existed.
pub async fn delete_by_participant_in<C: ConnectionTrait>(
    conn: &C,
    participant_id: Uuid,
) -> Result<Option<QueueEntryModel>, RepositoryError> {
    let Some(entry) = find_by_participant_in(conn, participant_id).await? else {
        return Ok(None);
    };

    entry
        .clone()
        .delete(conn)
        .await
        .map_err(RepositoryError::database_error)?;

    Ok(Some(entry))
}

//! # Admin Session Repository
//!
//! Stores issued organizer sessions by token digest.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::AdminSession;
use crate::models::admin_session::{
    self, ActiveModel as AdminSessionActiveModel, Model as AdminSessionModel,
};

#[derive(Debug, Clone)]
pub struct SessionRepository {
    pub db: Arc<DatabaseConnection>,
}

impl SessionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, token_hash: String) -> Result<AdminSessionModel, RepositoryError> {
        let session = AdminSessionActiveModel {
            id: Set(Uuid::new_v4()),
            token_hash: Set(token_hash),
            issued_at: Set(Utc::now().into()),
        };

        session
            .insert(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<AdminSessionModel>, RepositoryError> {
        AdminSession::find()
            .filter(admin_session::Column::TokenHash.eq(token_hash))
            .one(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = AdminSession::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(result.rows_affected > 0)
    }

    /// Drops sessions issued before `cutoff`
    pub async fn delete_issued_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = AdminSession::delete_many()
            .filter(admin_session::Column::IssuedAt.lt(cutoff))
            .exec(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(result.rows_affected)
    }
}

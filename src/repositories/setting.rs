//! Key-value settings repository.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

use crate::error::RepositoryError;
use crate::models::Setting;
use crate::models::setting::{self, ActiveModel as SettingActiveModel, Model as SettingModel};

#[derive(Debug, Clone)]
pub struct SettingRepository {
    pub db: Arc<DatabaseConnection>,
}

impl SettingRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str) -> Result<Option<SettingModel>, RepositoryError> {
        Setting::find_by_id(key.to_string())
            .one(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Returns the stored value, treating a missing row as empty
    pub async fn get_value(&self, key: &str) -> Result<String, RepositoryError> {
        Ok(self.get(key).await?.map(|row| row.value).unwrap_or_default())
    }

    /// Inserts or overwrites the value under `key`
    pub async fn upsert(&self, key: &str, value: &str) -> Result<SettingModel, RepositoryError> {
        let row = SettingActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(Utc::now().into()),
        };

        Setting::insert(row)
            .on_conflict(
                OnConflict::column(setting::Column::Key)
                    .update_columns([setting::Column::Value, setting::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?;

        self.get(key)
            .await?
            .ok_or_else(|| RepositoryError::not_found(format!("setting {key}")))
    }
}

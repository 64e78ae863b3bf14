//! Webhook settings and queue maintenance.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::info;
use url::Url;

use crate::config::WebhookConfig;
use crate::error::RosterError;
use crate::models::setting::{DISCORD_WEBHOOK_KEY, Model as SettingModel};
use crate::notifier::{Delivery, NotificationKind, WebhookNotifier};
use crate::repositories::{QueueEntryRepository, SettingRepository};

const MAX_WEBHOOK_URL_LEN: usize = 2048;

#[derive(Debug, Clone)]
pub struct SettingsService {
    settings: SettingRepository,
    queue: QueueEntryRepository,
    notifier: Arc<WebhookNotifier>,
    url_prefix: String,
}

impl SettingsService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        notifier: Arc<WebhookNotifier>,
        config: &WebhookConfig,
    ) -> Self {
        Self {
            settings: SettingRepository::new(Arc::clone(&db)),
            queue: QueueEntryRepository::new(db),
            notifier,
            url_prefix: config.url_prefix.clone(),
        }
    }

    /// The stored webhook URL, empty when notifications are disabled
    pub async fn get_webhook(&self) -> Result<String, RosterError> {
        Ok(self.settings.get_value(DISCORD_WEBHOOK_KEY).await?)
    }

    /// The stored webhook row, if one was ever written
    pub async fn webhook_setting(&self) -> Result<Option<SettingModel>, RosterError> {
        Ok(self.settings.get(DISCORD_WEBHOOK_KEY).await?)
    }

    /// Stores the webhook URL. An empty value disables notifications.
    pub async fn set_webhook(&self, url: &str) -> Result<SettingModel, RosterError> {
        let url = url.trim();
        if !url.is_empty() {
            self.validate_url(url)?;
        }

        let row = self.settings.upsert(DISCORD_WEBHOOK_KEY, url).await?;
        info!(enabled = !url.is_empty(), "Webhook setting updated");
        Ok(row)
    }

    /// Sends the test announcement to `url`, or to the stored URL when none is given.
    pub async fn test_webhook(&self, url: Option<&str>) -> Result<Delivery, RosterError> {
        let url = match url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(candidate) => {
                self.validate_url(candidate)?;
                candidate.to_string()
            }
            None => self.get_webhook().await?,
        };

        if url.is_empty() {
            return Ok(Delivery::NotConfigured);
        }
        Ok(self
            .notifier
            .deliver_to(&url, NotificationKind::Test, "")
            .await)
    }

    /// Deletes every MOR queue entry.
    pub async fn clear_queue(&self) -> Result<u64, RosterError> {
        let deleted = self.queue.delete_all().await?;
        info!(deleted, "Cleared MOR queue");
        Ok(deleted)
    }

    fn validate_url(&self, url: &str) -> Result<(), RosterError> {
        let problem = if url.len() > MAX_WEBHOOK_URL_LEN {
            Some(format!("must be at most {MAX_WEBHOOK_URL_LEN} characters"))
        } else if !url.starts_with(&self.url_prefix) {
            Some(format!("must start with {}", self.url_prefix))
        } else if Url::parse(url).is_err() {
            Some("is not a valid URL".to_string())
        } else {
            None
        };

        match problem {
            Some(problem) => Err(RosterError::validation(
                "Invalid webhook URL",
                json!({ "url": format!("Webhook URL {problem}") }),
            )),
            None => Ok(()),
        }
    }
}

//! # Notification Gateway
//!
//! Posts short announcements about MOR queue changes to the configured chat
//! webhook. Delivery is best-effort: every failure is reported as a
//! [`Delivery`] value and never as an error, and nothing is retried.

use std::time::{SystemTime, UNIX_EPOCH};

use metrics::counter;
use rand::Rng;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::config::WebhookConfig;
use crate::models::setting::DISCORD_WEBHOOK_KEY;
use crate::repositories::SettingRepository;

const REFERENCE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const REFERENCE_SUFFIX_LEN: usize = 9;

/// Which announcement is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Queued,
    Removed,
    Test,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Queued => "queued",
            NotificationKind::Removed => "removed",
            NotificationKind::Test => "test",
        }
    }

    fn content(&self, player_name: &str) -> String {
        match self {
            NotificationKind::Queued => format!("🔁 {player_name} received MOR priority"),
            NotificationKind::Removed => {
                format!("🗑️ **{player_name}** was removed from the MOR list")
            }
            NotificationKind::Test => "✅ Roster webhook connection tested successfully!".to_string(),
        }
    }
}

/// Outcome of one notification attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The webhook answered 2xx. Queued announcements carry a local reference.
    Delivered { reference: Option<String> },
    /// No webhook URL is stored; no request was made.
    NotConfigured,
    Failed { reason: String },
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered { .. })
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            Delivery::Delivered { reference } => reference.as_deref(),
            _ => None,
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            Delivery::Delivered { .. } => "delivered",
            Delivery::NotConfigured => "not_configured",
            Delivery::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: String,
    username: &'a str,
}

/// Chat webhook client
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    username: String,
    test_username: String,
    settings: SettingRepository,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig, settings: SettingRepository) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            username: config.username.clone(),
            test_username: format!("{} - Test", config.username),
            settings,
        })
    }

    /// Sends `kind` to the stored webhook URL.
    pub async fn notify(&self, kind: NotificationKind, player_name: &str) -> Delivery {
        let url = match self.settings.get_value(DISCORD_WEBHOOK_KEY).await {
            Ok(url) => url,
            Err(err) => {
                let delivery = Delivery::Failed {
                    reason: format!("could not read webhook setting: {err}"),
                };
                warn!(kind = kind.as_str(), error = %err, "Webhook lookup failed");
                record(kind, &delivery);
                return delivery;
            }
        };

        if url.trim().is_empty() {
            info!(kind = kind.as_str(), "Webhook not configured; skipping notification");
            let delivery = Delivery::NotConfigured;
            record(kind, &delivery);
            return delivery;
        }

        self.deliver_to(&url, kind, player_name).await
    }

    /// Sends `kind` to an explicit URL, bypassing the stored setting.
    pub async fn deliver_to(&self, url: &str, kind: NotificationKind, player_name: &str) -> Delivery {
        let username = match kind {
            NotificationKind::Test => self.test_username.as_str(),
            _ => self.username.as_str(),
        };
        let payload = WebhookPayload {
            content: kind.content(player_name),
            username,
        };

        let delivery = match self.client.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => Delivery::Delivered {
                reference: (kind == NotificationKind::Queued).then(new_reference),
            },
            Ok(response) => Delivery::Failed {
                reason: format!("webhook answered {}", response.status()),
            },
            Err(err) if err.is_timeout() => Delivery::Failed {
                reason: "webhook timed out".to_string(),
            },
            // The webhook URL carries its secret token; keep it out of the reason.
            Err(err) => Delivery::Failed {
                reason: format!("webhook request failed: {}", err.without_url()),
            },
        };

        match &delivery {
            Delivery::Failed { reason } => warn!(
                kind = kind.as_str(),
                webhook = %redacted_target(url),
                reason = %reason,
                "Webhook notification not delivered"
            ),
            _ => info!(
                kind = kind.as_str(),
                webhook = %redacted_target(url),
                "Webhook notification delivered"
            ),
        }
        record(kind, &delivery);
        delivery
    }
}

fn record(kind: NotificationKind, delivery: &Delivery) {
    counter!(
        "roster_notifications_total",
        "kind" => kind.as_str(),
        "outcome" => delivery.outcome()
    )
    .increment(1);
}

/// Local bookkeeping reference for a delivered queued announcement
fn new_reference() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..REFERENCE_SUFFIX_LEN)
        .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())] as char)
        .collect();
    format!("mor_{millis}_{suffix}")
}

// Webhook URLs embed their secret token in the path.
fn redacted_target(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|parsed| {
            format!(
                "{}://{}",
                parsed.scheme(),
                parsed.host_str().unwrap_or("unknown")
            )
        })
        .unwrap_or_else(|| "[invalid-url]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_name_the_player() {
        assert_eq!(
            NotificationKind::Queued.content("Aria"),
            "🔁 Aria received MOR priority"
        );
        assert_eq!(
            NotificationKind::Removed.content("Aria"),
            "🗑️ **Aria** was removed from the MOR list"
        );
        assert!(!NotificationKind::Test.content("").is_empty());
    }

    #[test]
    fn reference_has_expected_shape() {
        let reference = new_reference();
        let parts: Vec<&str> = reference.split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "mor");
        assert!(parts[1].parse::<u128>().is_ok());
        assert_eq!(parts[2].len(), REFERENCE_SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| REFERENCE_ALPHABET.contains(&b)));
    }

    #[test]
    fn redacts_webhook_token() {
        let target = redacted_target("https://discord.com/api/webhooks/1/secret-token");
        assert_eq!(target, "https://discord.com");
        assert_eq!(redacted_target("not a url"), "[invalid-url]");
    }

    #[test]
    fn only_delivered_carries_reference() {
        let delivered = Delivery::Delivered {
            reference: Some("mor_1_abc".to_string()),
        };
        assert!(delivered.is_delivered());
        assert_eq!(delivered.reference(), Some("mor_1_abc"));
        assert_eq!(Delivery::NotConfigured.reference(), None);
        assert!(!Delivery::Failed { reason: "x".into() }.is_delivered());
    }
}

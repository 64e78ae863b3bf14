//! Test utilities for database and router testing.
//!
//! This module provides utilities for setting up in-memory SQLite databases
//! with migrations, application state and authenticated router requests.

#![allow(dead_code)]

use anyhow::Result;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use migration::{Migrator, MigratorTrait};
use roster::{
    config::{AppConfig, WebhookConfig},
    models::participant::Model as ParticipantModel,
    models::setting::DISCORD_WEBHOOK_KEY,
    notifier::WebhookNotifier,
    repositories::{NewParticipant, ParticipantRepository, SettingRepository},
    server::{AppState, create_app},
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// The pool is limited to one connection: every SQLite memory connection is
/// its own database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    Ok(Arc::new(setup_test_db().await?))
}

/// Configuration accepted by `AppConfig::validate`, with webhook URLs
/// allowed under `webhook_prefix`.
pub fn test_config(webhook_prefix: &str) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        webhook: WebhookConfig {
            timeout_ms: 500,
            url_prefix: webhook_prefix.to_string(),
            ..WebhookConfig::default()
        },
        ..AppConfig::default()
    }
}

pub fn test_state(db: DatabaseConnection, config: AppConfig) -> AppState {
    AppState::new(Arc::new(config), db).expect("build app state")
}

pub fn test_notifier(db: Arc<DatabaseConnection>) -> Arc<WebhookNotifier> {
    let config = test_config("http://127.0.0.1/");
    Arc::new(
        WebhookNotifier::new(&config.webhook, SettingRepository::new(db))
            .expect("build webhook client"),
    )
}

pub async fn store_webhook(db: &Arc<DatabaseConnection>, url: &str) -> Result<()> {
    SettingRepository::new(Arc::clone(db))
        .upsert(DISCORD_WEBHOOK_KEY, url)
        .await?;
    Ok(())
}

pub async fn insert_participant(
    db: &Arc<DatabaseConnection>,
    name: &str,
    role: roster::models::Role,
    ip: i64,
) -> Result<ParticipantModel> {
    let participant = ParticipantRepository::new(Arc::clone(db))
        .create(NewParticipant {
            player_name: name.to_string(),
            role,
            ip,
        })
        .await?;
    Ok(participant)
}

/// Thin request helper over a router built from `state`.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new(state: AppState) -> Self {
        Self {
            router: create_app(state.clone()),
            state,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        Ok((status, json))
    }

    pub async fn login(&self) -> Result<String> {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(serde_json::json!({ "password": ADMIN_PASSWORD })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {status} {body}");
        body["token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("login response without token"))
    }
}

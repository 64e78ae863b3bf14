//! # Server Configuration
//!
//! Router assembly, shared state and the HTTP listener.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::flows::{RegistrationService, SelectionService, SettingsService};
use crate::handlers;
use crate::notifier::WebhookNotifier;
use crate::repositories::SettingRepository;
use crate::telemetry::trace_id_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub notifier: Arc<WebhookNotifier>,
}

impl AppState {
    /// Builds the state, including the webhook client.
    pub fn new(config: Arc<AppConfig>, db: DatabaseConnection) -> Result<Self, reqwest::Error> {
        let settings = SettingRepository::new(Arc::new(db.clone()));
        let notifier = Arc::new(WebhookNotifier::new(&config.webhook, settings)?);
        Ok(Self {
            config,
            db,
            notifier,
        })
    }

    pub fn registration(&self) -> RegistrationService {
        RegistrationService::new(Arc::new(self.db.clone()))
    }

    pub fn selection(&self) -> SelectionService {
        SelectionService::new(Arc::new(self.db.clone()), Arc::clone(&self.notifier))
    }

    pub fn settings(&self) -> SettingsService {
        SettingsService::new(
            Arc::new(self.db.clone()),
            Arc::clone(&self.notifier),
            &self.config.webhook,
        )
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        .route("/api/v1/board", get(handlers::selection::get_board))
        .route(
            "/api/v1/participants/{id}",
            get(handlers::selection::get_participant),
        )
        .route(
            "/api/v1/participants/{id}/select",
            post(handlers::selection::select_participant),
        )
        .route(
            "/api/v1/participants/{id}/defer",
            post(handlers::selection::defer_participant),
        )
        .route(
            "/api/v1/participants/{id}/deselect",
            post(handlers::selection::deselect_participant),
        )
        .route(
            "/api/v1/roles/wildcard/draw",
            post(handlers::selection::draw_wildcard),
        )
        .route(
            "/api/v1/queue",
            get(handlers::queue::list_queue).delete(handlers::queue::clear_queue),
        )
        .route(
            "/api/v1/queue/{id}",
            delete(handlers::queue::remove_queue_entry),
        )
        .route(
            "/api/v1/settings/webhook",
            get(handlers::settings::get_webhook).put(handlers::settings::put_webhook),
        )
        .route(
            "/api/v1/settings/webhook/test",
            post(handlers::settings::test_webhook),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Registration is public while clearing the session is not.
    let participants = post(handlers::registration::register_participant).merge(
        delete(handlers::selection::clear_participants).route_layer(
            middleware::from_fn_with_state(state.clone(), auth_middleware),
        ),
    );

    let public = Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/api/v1/roles", get(handlers::list_roles))
        .route("/api/v1/participants", participants)
        .route("/api/v1/auth/login", post(handlers::auth::login));

    public
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id_middleware))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState::new(Arc::new(config), db)?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Roster API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::list_roles,
        crate::handlers::registration::register_participant,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::selection::get_board,
        crate::handlers::selection::get_participant,
        crate::handlers::selection::select_participant,
        crate::handlers::selection::defer_participant,
        crate::handlers::selection::deselect_participant,
        crate::handlers::selection::draw_wildcard,
        crate::handlers::selection::clear_participants,
        crate::handlers::queue::list_queue,
        crate::handlers::queue::remove_queue_entry,
        crate::handlers::queue::clear_queue,
        crate::handlers::settings::get_webhook,
        crate::handlers::settings::put_webhook,
        crate::handlers::settings::test_webhook,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::Role,
            crate::models::RoleCategory,
            crate::models::ParticipantStatus,
            crate::error::ApiError,
            crate::handlers::HealthResponse,
            crate::handlers::RoleInfo,
            crate::handlers::types::ParticipantView,
            crate::handlers::types::QueueEntryView,
            crate::handlers::types::NotificationNotice,
            crate::handlers::types::DeletedResponse,
            crate::handlers::registration::RegisterParticipantRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::handlers::selection::BoardResponse,
            crate::handlers::selection::RoleGroup,
            crate::handlers::selection::TransitionResponse,
            crate::handlers::queue::RemovedEntryResponse,
            crate::handlers::settings::WebhookSettingResponse,
            crate::handlers::settings::UpdateWebhookRequest,
            crate::handlers::settings::TestWebhookRequest,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "root", description = "Service information"),
        (name = "registration", description = "Participant sign-up"),
        (name = "auth", description = "Organizer sessions"),
        (name = "selection", description = "Dashboard and state transitions"),
        (name = "queue", description = "MOR priority list"),
        (name = "settings", description = "Chat webhook configuration"),
    ),
    info(
        title = "Roster API",
        description = "Event registration and selection with a carry-over priority list",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;

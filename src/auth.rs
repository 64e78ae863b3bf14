//! # Authentication Gate
//!
//! Server-issued organizer sessions. Logging in with the configured admin
//! password yields an opaque bearer token; only its SHA-256 digest is stored.
//! Protected routes require a known session younger than the configured TTL.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sea_orm::DatabaseConnection;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, RosterError, unauthorized};
use crate::models::admin_session::Model as AdminSessionModel;
use crate::repositories::SessionRepository;
use crate::server::AppState;

const TOKEN_BYTES: usize = 32;

/// Marker inserted by [`auth_middleware`] for authenticated organizer requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminAuth {
    pub session_id: Uuid,
}

/// A freshly issued session; `token` is only ever returned once
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Generates a new random bearer token
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex-encoded SHA-256 digest of a bearer token
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn is_session_fresh(issued_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now - issued_at < ttl
}

#[derive(Debug, Clone)]
pub struct SessionGate {
    sessions: SessionRepository,
    admin_password: Option<String>,
    ttl: Duration,
}

impl SessionGate {
    pub fn new(db: Arc<DatabaseConnection>, admin_password: Option<String>, ttl: Duration) -> Self {
        Self {
            sessions: SessionRepository::new(db),
            admin_password,
            ttl,
        }
    }

    /// Exchanges the admin password for a new session token.
    pub async fn login(&self, password: &str) -> Result<IssuedSession, ApiError> {
        let Some(expected) = self.admin_password.as_deref() else {
            warn!("Login attempted but no admin password is configured");
            return Err(unauthorized(Some("Invalid credentials")));
        };

        let matches: bool = password.as_bytes().ct_eq(expected.as_bytes()).into();
        if !matches {
            warn!("Rejected organizer login");
            return Err(unauthorized(Some("Invalid credentials")));
        }

        // Opportunistic cleanup; failure here must not block a login.
        if let Err(err) = self.sessions.delete_issued_before(Utc::now() - self.ttl).await {
            warn!(error = %err, "Could not prune expired sessions");
        }

        let token = generate_token();
        let session = self
            .sessions
            .create(hash_token(&token))
            .await
            .map_err(RosterError::from)?;

        let issued_at: DateTime<Utc> = session.issued_at.with_timezone(&Utc);
        info!(session_id = %session.id, "Organizer session issued");

        Ok(IssuedSession {
            token,
            issued_at,
            expires_at: issued_at + self.ttl,
        })
    }

    /// Resolves a bearer token to a live session. Stale sessions are deleted.
    pub async fn authenticate(&self, token: &str) -> Result<AdminSessionModel, RosterError> {
        let session = self
            .sessions
            .find_by_hash(&hash_token(token))
            .await?
            .ok_or(RosterError::AuthExpired)?;

        let issued_at = session.issued_at.with_timezone(&Utc);
        if !is_session_fresh(issued_at, Utc::now(), self.ttl) {
            if let Err(err) = self.sessions.delete(session.id).await {
                warn!(session_id = %session.id, error = %err, "Could not delete stale session");
            }
            info!(session_id = %session.id, "Organizer session expired");
            return Err(RosterError::AuthExpired);
        }

        Ok(session)
    }

    pub async fn logout(&self, session_id: Uuid) -> Result<(), RosterError> {
        self.sessions.delete(session_id).await?;
        info!(session_id = %session_id, "Organizer session ended");
        Ok(())
    }
}

impl AppState {
    pub fn session_gate(&self) -> SessionGate {
        SessionGate::new(
            Arc::new(self.db.clone()),
            self.config.admin_password.clone(),
            self.config.session_ttl(),
        )
    }
}

/// Rejects requests without a live organizer session
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;
    let session = state.session_gate().authenticate(token).await?;

    request.extensions_mut().insert(AdminAuth {
        session_id: session.id,
    });

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminAuth>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Organizer session required")))
    }
}

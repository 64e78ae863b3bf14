//! # Data Models
//!
//! This module contains all the data models used throughout the roster service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod admin_session;
pub mod participant;
pub mod queue_entry;
pub mod setting;

pub use admin_session::Entity as AdminSession;
pub use participant::{Entity as Participant, ParticipantStatus, Role, RoleCategory};
pub use queue_entry::Entity as QueueEntry;
pub use setting::Entity as Setting;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "roster".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

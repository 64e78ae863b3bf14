//! # Roster Flows
//!
//! Organizer and registrant operations built on the repositories and the
//! notification gateway. HTTP handlers and the admin CLI are thin callers of
//! these services.

pub mod registration;
pub mod selection;
pub mod settings;

pub use registration::{RegistrationService, Submission};
pub use selection::{Board, SelectionService, Transition, draw_pending, group_by_role};
pub use settings::SettingsService;

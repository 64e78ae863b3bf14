//! # Repository Layer
//!
//! Repository implementations that encapsulate SeaORM operations for the
//! roster tables. Functions suffixed `_in` take any connection so callers can
//! run them inside a transaction.

pub mod participant;
pub mod queue_entry;
pub mod session;
pub mod setting;

pub use participant::{NewParticipant, ParticipantRepository};
pub use queue_entry::QueueEntryRepository;
pub use session::SessionRepository;
pub use setting::SettingRepository;

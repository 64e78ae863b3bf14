//! # Roster Library
//!
//! Event registration and selection service: participants sign up by role,
//! an organizer selects them or defers them to a carry-over priority list,
//! and queue changes are announced to a chat webhook.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod flows;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;

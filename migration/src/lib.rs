//! Database migrations for the roster service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_06_07_000001_create_participants;
mod m2025_06_07_000002_create_mor_list;
mod m2025_06_07_000003_create_settings;
mod m2025_06_08_000001_create_admin_sessions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_07_000001_create_participants::Migration),
            Box::new(m2025_06_07_000002_create_mor_list::Migration),
            Box::new(m2025_06_07_000003_create_settings::Migration),
            Box::new(m2025_06_08_000001_create_admin_sessions::Migration),
        ]
    }
}

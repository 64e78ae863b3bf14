//! Migration to create the participants table.
//!
//! One row per sign-up in the current session. Rows are purged in bulk when
//! the organizer starts a new session.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Participants::PlayerName).text().not_null())
                    .col(ColumnDef::new(Participants::Role).text().not_null())
                    .col(ColumnDef::new(Participants::Ip).big_integer().not_null())
                    .col(
                        ColumnDef::new(Participants::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Participants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_participants_created_at")
                    .table(Participants::Table)
                    .col(Participants::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Participants::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Participants {
    Table,
    Id,
    PlayerName,
    Role,
    Ip,
    Status,
    CreatedAt,
}

//! Migration to create the MOR priority list.
//!
//! `player_id` has no foreign key: entries outlive the
//! participant rows they were granted to.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MorList::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MorList::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(MorList::PlayerId).uuid().not_null())
                    .col(ColumnDef::new(MorList::PlayerName).text().not_null())
                    .col(ColumnDef::new(MorList::DiscordMessageId).text().null())
                    .col(
                        ColumnDef::new(MorList::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one active entry per player.
        manager
            .create_index(
                Index::create()
                    .name("idx_mor_list_player_id")
                    .table(MorList::Table)
                    .col(MorList::PlayerId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MorList::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MorList {
    #[sea_orm(iden = "mor_list")]
    Table,
    Id,
    PlayerId,
    PlayerName,
    DiscordMessageId,
    CreatedAt,
}

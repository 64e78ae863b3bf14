//! # MOR Queue Entry Model
//!
//! A carry-over priority marker. The player name is a copy; entries outlive
//! the participant row when a session is cleared.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mor_list")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Participant that earned the priority (not a foreign key)
    #[sea_orm(column_name = "player_id")]
    pub participant_id: Uuid,

    pub player_name: String,

    /// Local reference of the "queued" announcement, if it was delivered
    #[sea_orm(column_name = "discord_message_id")]
    pub notification_ref: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

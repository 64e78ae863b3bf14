//! # Participant Model
//!
//! SeaORM entity for the `participants` table plus the fixed role catalogue
//! and the per-participant selection status.

use std::fmt;
use std::str::FromStr;

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A registered entrant for the current session
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "participants")]
pub struct Model {
    /// Unique identifier, stable across the participant's lifecycle
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// In-game display name
    pub player_name: String,

    /// Role the player signed up for
    pub role: Role,

    /// Power rating ("IP") reported by the player
    pub ip: i64,

    /// Current selection status
    pub status: ParticipantStatus,

    /// Registration timestamp (immutable)
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Selection status of a participant
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,

    #[sea_orm(string_value = "selected")]
    Selected,

    /// Deferred to the MOR priority list
    #[sea_orm(string_value = "queued")]
    Queued,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Pending => "pending",
            ParticipantStatus::Selected => "selected",
            ParticipantStatus::Queued => "queued",
        }
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad grouping used when presenting the role catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoleCategory {
    Tank,
    Control,
    Healer,
    Dps,
    Special,
    Debuff,
}

/// The fixed set of roles a player can register for.
///
/// Stored and serialized by their in-game labels. `Ord` follows declaration
/// order, which is also the order of the sign-up form.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Role {
    #[sea_orm(string_value = "Off Tank")]
    #[serde(rename = "Off Tank")]
    OffTank,
    #[sea_orm(string_value = "Elevado")]
    #[serde(rename = "Elevado")]
    Elevado,
    #[sea_orm(string_value = "Silence")]
    #[serde(rename = "Silence")]
    Silence,
    #[sea_orm(string_value = "Healer")]
    #[serde(rename = "Healer")]
    Healer,
    #[sea_orm(string_value = "Raiz Ferrea (Party Heal)")]
    #[serde(rename = "Raiz Ferrea (Party Heal)")]
    PartyHealer,
    #[sea_orm(string_value = "DPS - Frost")]
    #[serde(rename = "DPS - Frost")]
    DpsFrost,
    #[sea_orm(string_value = "DPS - Fire")]
    #[serde(rename = "DPS - Fire")]
    DpsFire,
    #[sea_orm(string_value = "DPS - Aguia")]
    #[serde(rename = "DPS - Aguia")]
    DpsAguia,
    #[sea_orm(string_value = "DPS - Xbow")]
    #[serde(rename = "DPS - Xbow")]
    DpsXbow,
    #[sea_orm(string_value = "DPS - Raiz Ferrea")]
    #[serde(rename = "DPS - Raiz Ferrea")]
    DpsRaizFerrea,
    #[sea_orm(string_value = "Roletroll")]
    #[serde(rename = "Roletroll")]
    Roletroll,
    #[sea_orm(string_value = "Scout")]
    #[serde(rename = "Scout")]
    Scout,
    #[sea_orm(string_value = "Oculto")]
    #[serde(rename = "Oculto")]
    Oculto,
    #[sea_orm(string_value = "Debuff - Quebrareinos")]
    #[serde(rename = "Debuff - Quebrareinos")]
    DebuffQuebrareinos,
    #[sea_orm(string_value = "Debuff - Incubo")]
    #[serde(rename = "Debuff - Incubo")]
    DebuffIncubo,
    #[sea_orm(string_value = "Debuff - Bruxo")]
    #[serde(rename = "Debuff - Bruxo")]
    DebuffBruxo,
}

impl Role {
    /// The role resolved by random draw instead of organizer choice
    pub const WILDCARD: Role = Role::Roletroll;

    /// Every role, in sign-up form order
    pub const ALL: [Role; 16] = [
        Role::OffTank,
        Role::Elevado,
        Role::Silence,
        Role::Healer,
        Role::PartyHealer,
        Role::DpsFrost,
        Role::DpsFire,
        Role::DpsAguia,
        Role::DpsXbow,
        Role::DpsRaizFerrea,
        Role::Roletroll,
        Role::Scout,
        Role::Oculto,
        Role::DebuffQuebrareinos,
        Role::DebuffIncubo,
        Role::DebuffBruxo,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Role::OffTank => "Off Tank",
            Role::Elevado => "Elevado",
            Role::Silence => "Silence",
            Role::Healer => "Healer",
            Role::PartyHealer => "Raiz Ferrea (Party Heal)",
            Role::DpsFrost => "DPS - Frost",
            Role::DpsFire => "DPS - Fire",
            Role::DpsAguia => "DPS - Aguia",
            Role::DpsXbow => "DPS - Xbow",
            Role::DpsRaizFerrea => "DPS - Raiz Ferrea",
            Role::Roletroll => "Roletroll",
            Role::Scout => "Scout",
            Role::Oculto => "Oculto",
            Role::DebuffQuebrareinos => "Debuff - Quebrareinos",
            Role::DebuffIncubo => "Debuff - Incubo",
            Role::DebuffBruxo => "Debuff - Bruxo",
        }
    }

    pub fn category(&self) -> RoleCategory {
        match self {
            Role::OffTank | Role::Elevado => RoleCategory::Tank,
            Role::Silence => RoleCategory::Control,
            Role::Healer | Role::PartyHealer => RoleCategory::Healer,
            Role::DpsFrost
            | Role::DpsFire
            | Role::DpsAguia
            | Role::DpsXbow
            | Role::DpsRaizFerrea => RoleCategory::Dps,
            Role::Roletroll | Role::Scout | Role::Oculto => RoleCategory::Special,
            Role::DebuffQuebrareinos | Role::DebuffIncubo | Role::DebuffBruxo => {
                RoleCategory::Debuff
            }
        }
    }

    pub fn is_wildcard(&self) -> bool {
        *self == Self::WILDCARD
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a label is not part of the role catalogue
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.label() == value)
            .ok_or_else(|| UnknownRole(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.label().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn free_text_roles_are_rejected() {
        assert_eq!(
            "healer".parse::<Role>(),
            Err(UnknownRole("healer".to_string()))
        );
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn exactly_one_wildcard_role() {
        let wildcards: Vec<_> = Role::ALL.iter().filter(|r| r.is_wildcard()).collect();
        assert_eq!(wildcards, vec![&Role::Roletroll]);
    }

    #[test]
    fn serde_uses_labels() {
        let json = serde_json::to_string(&Role::PartyHealer).unwrap();
        assert_eq!(json, "\"Raiz Ferrea (Party Heal)\"");

        let status = serde_json::to_string(&ParticipantStatus::Queued).unwrap();
        assert_eq!(status, "\"queued\"");
    }

    #[test]
    fn categories_match_role_families() {
        assert_eq!(Role::Elevado.category(), RoleCategory::Tank);
        assert_eq!(Role::DpsXbow.category(), RoleCategory::Dps);
        assert_eq!(Role::DebuffBruxo.category(), RoleCategory::Debuff);
        assert_eq!(Role::Roletroll.category(), RoleCategory::Special);
    }
}

//! Slot entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "slots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub station_id: String,
    pub connector_type: String,

    /// Slot status: Available, Booked, Inactive
    pub status: String,

    #[sea_orm(nullable)]
    pub active_from: Option<DateTimeUtc>,

    #[sea_orm(nullable)]
    pub active_until: Option<DateTimeUtc>,

    /// JSON array of generated time slot ids
    #[sea_orm(column_type = "Text")]
    pub time_slot_ids: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::station::Entity",
        from = "Column::StationId",
        to = "super::station::Column::Id"
    )]
    Station,
}

impl Related<super::station::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Station.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

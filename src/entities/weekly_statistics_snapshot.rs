use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Frozen copy of a weekly statistics row owned by a snapshot
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "weekly_statistics_snapshots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub snapshot_id: i32,
    pub inv_type_code: String,
    pub hotel_id: String,
    pub week_start_date: Date,
    pub week_end_date: Date,
    pub actual_occupancy_rate: f64,
    pub actual_vacancy_rate: f64,
    pub total_occupancy_rate: f64,
    pub total_vacancy_rate: f64,
    pub total_rooms: i32,
    pub total_available_days: i32,
    pub total_days: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::data_snapshot::Entity",
        from = "Column::SnapshotId",
        to = "super::data_snapshot::Column::Id",
        on_delete = "Cascade"
    )]
    DataSnapshot,
}

impl Related<super::data_snapshot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DataSnapshot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

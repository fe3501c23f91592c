use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Metadata row of a point-in-time copy; at most one per calendar date
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "data_snapshots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub snapshot_date: Date,
    pub snapshot_time: DateTimeUtc,
    pub description: Option<String>,
    pub status: SnapshotStatus,
    pub total_records: i32,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory_snapshot::Entity")]
    InventorySnapshots,
    #[sea_orm(has_many = "super::weekly_statistics_snapshot::Entity")]
    WeeklyStatisticsSnapshots,
}

impl Related<super::inventory_snapshot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventorySnapshots.def()
    }
}

impl Related<super::weekly_statistics_snapshot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeeklyStatisticsSnapshots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Snapshot lifecycle; rows are only ever visible as `Completed` outside the creating transaction
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SnapshotStatus {
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "completed")]
    Completed,
}

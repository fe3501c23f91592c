use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Frozen copy of an inventory row owned by a snapshot
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_snapshots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub snapshot_id: i32,
    pub inv_type_code: String,
    pub hotel_id: String,
    pub date: Date,
    pub quantity: i32,
    pub status: String,
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

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A bookable room category, unique per (inv_type_code, hotel_id)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "room_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub inv_type_code: String,
    pub hotel_id: String,
    pub name: String,
    pub total_rooms: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

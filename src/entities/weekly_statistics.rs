use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Weekly occupancy aggregate, unique per (inv_type_code, week_start_date, hotel_id)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "weekly_statistics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
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
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

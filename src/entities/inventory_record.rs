use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Remaining rooms of one room type on one calendar day
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_data")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub inv_type_code: String,
    pub hotel_id: String,
    pub date: Date,
    pub quantity: i32,
    pub status: String,
}

impl Model {
    /// Days reported as `OPEN` by the channel manager count towards actual rates
    pub fn is_open(&self) -> bool {
        is_open_status(&self.status)
    }
}

pub fn is_open_status(status: &str) -> bool {
    status.eq_ignore_ascii_case("OPEN")
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_status_is_case_insensitive() {
        assert!(is_open_status("OPEN"));
        assert!(is_open_status("open"));
        assert!(!is_open_status("CLOSE"));
        assert!(!is_open_status(""));
    }
}

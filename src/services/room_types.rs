use crate::{
    db::DbPool,
    entities::{
        inventory_record::{self, Entity as InventoryRecord},
        room_type::{self, Entity as RoomType},
        weekly_statistics::{self, Entity as WeeklyStatistics},
    },
    errors::ServiceError,
    services::hotels::HotelDirectory,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, sync::Arc};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Payload for registering a room type
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRoomType {
    #[validate(length(min = 1, max = 50))]
    #[schema(example = "A")]
    pub inv_type_code: String,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Forest view twin")]
    pub name: String,
    #[validate(range(min = 0, max = 10000))]
    #[schema(example = 10)]
    pub total_rooms: i32,
    #[validate(length(min = 1, max = 20))]
    #[schema(example = "2436")]
    pub hotel_id: String,
}

/// Editable attributes of a room type
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateRoomType {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 0, max = 10000))]
    pub total_rooms: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoomTypeView {
    pub id: i32,
    pub inv_type_code: String,
    pub name: String,
    pub total_rooms: i32,
    pub hotel_id: String,
    pub hotel_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomTypeView {
    pub(crate) fn from_model(model: room_type::Model, hotels: &HotelDirectory) -> Self {
        Self {
            hotel_name: hotels.name_for(&model.hotel_id),
            id: model.id,
            inv_type_code: model.inv_type_code,
            name: model.name,
            total_rooms: model.total_rooms,
            hotel_id: model.hotel_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct RoomTypeService {
    db_pool: Arc<DbPool>,
    hotels: HotelDirectory,
}

impl RoomTypeService {
    pub fn new(db_pool: Arc<DbPool>, hotels: HotelDirectory) -> Self {
        Self { db_pool, hotels }
    }

    /// Lists room types ordered by hotel then code
    #[instrument(skip(self))]
    pub async fn list(&self, hotel_id: Option<&str>) -> Result<Vec<RoomTypeView>, ServiceError> {
        let db = self.db_pool.as_ref();
        let mut query = RoomType::find();
        if let Some(hotel_id) = hotel_id {
            query = query.filter(room_type::Column::HotelId.eq(hotel_id));
        }

        let rows = query
            .order_by_asc(room_type::Column::HotelId)
            .order_by_asc(room_type::Column::InvTypeCode)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| RoomTypeView::from_model(row, &self.hotels))
            .collect())
    }

    /// Raw room type rows, used by the fetch loop
    pub async fn all(&self, hotel_id: Option<&str>) -> Result<Vec<room_type::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        let mut query = RoomType::find();
        if let Some(hotel_id) = hotel_id {
            query = query.filter(room_type::Column::HotelId.eq(hotel_id));
        }
        Ok(query
            .order_by_asc(room_type::Column::HotelId)
            .order_by_asc(room_type::Column::InvTypeCode)
            .all(db)
            .await?)
    }

    pub async fn find(
        &self,
        inv_type_code: &str,
        hotel_id: &str,
    ) -> Result<Option<room_type::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        Ok(RoomType::find()
            .filter(room_type::Column::InvTypeCode.eq(inv_type_code))
            .filter(room_type::Column::HotelId.eq(hotel_id))
            .one(db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateRoomType) -> Result<RoomTypeView, ServiceError> {
        input.validate()?;

        if self.find(&input.inv_type_code, &input.hotel_id).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "room type {} already exists for hotel {}",
                input.inv_type_code, input.hotel_id
            )));
        }

        let now = Utc::now();
        let model = room_type::ActiveModel {
            inv_type_code: Set(input.inv_type_code.clone()),
            hotel_id: Set(input.hotel_id.clone()),
            name: Set(input.name),
            total_rooms: Set(input.total_rooms),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = model.insert(self.db_pool.as_ref()).await.map_err(|e| {
            let err = ServiceError::DatabaseError(e);
            if err.is_unique_violation() {
                ServiceError::Conflict(format!(
                    "room type {} already exists for hotel {}",
                    input.inv_type_code, input.hotel_id
                ))
            } else {
                err
            }
        })?;

        info!(id = created.id, inv_type_code = %created.inv_type_code, hotel_id = %created.hotel_id, "Room type created");
        Ok(RoomTypeView::from_model(created, &self.hotels))
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: i32, input: UpdateRoomType) -> Result<RoomTypeView, ServiceError> {
        input.validate()?;
        let db = self.db_pool.as_ref();

        let existing = RoomType::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("room type {}", id)))?;

        let mut model: room_type::ActiveModel = existing.into();
        model.name = Set(input.name);
        model.total_rooms = Set(input.total_rooms);
        model.updated_at = Set(Utc::now());

        let updated = model.update(db).await?;
        info!(id, "Room type updated");
        Ok(RoomTypeView::from_model(updated, &self.hotels))
    }

    /// Deletes a room type that has no inventory or statistics rows left
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();

        let existing = RoomType::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("room type {}", id)))?;

        let inventory_rows = InventoryRecord::find()
            .filter(inventory_record::Column::InvTypeCode.eq(existing.inv_type_code.clone()))
            .filter(inventory_record::Column::HotelId.eq(existing.hotel_id.clone()))
            .count(db)
            .await?;
        if inventory_rows > 0 {
            warn!(id, inventory_rows, "Refusing to delete room type with inventory");
            return Err(ServiceError::Conflict(format!(
                "room type {} (hotel {}) still has {} inventory records",
                existing.inv_type_code, existing.hotel_id, inventory_rows
            )));
        }

        let statistics_rows = WeeklyStatistics::find()
            .filter(weekly_statistics::Column::InvTypeCode.eq(existing.inv_type_code.clone()))
            .filter(weekly_statistics::Column::HotelId.eq(existing.hotel_id.clone()))
            .count(db)
            .await?;
        if statistics_rows > 0 {
            warn!(id, statistics_rows, "Refusing to delete room type with statistics");
            return Err(ServiceError::Conflict(format!(
                "room type {} (hotel {}) still has {} weekly statistics records",
                existing.inv_type_code, existing.hotel_id, statistics_rows
            )));
        }

        RoomType::delete_by_id(id).exec(db).await?;
        info!(id, "Room type deleted");
        Ok(())
    }

    /// Registered room types, as (inv_type_code, hotel_id), that have at least one
    /// inventory row. Inventory fetched for unregistered codes is ignored.
    #[instrument(skip(self))]
    pub async fn list_with_inventory(
        &self,
        hotel_id: Option<&str>,
    ) -> Result<Vec<(String, String)>, ServiceError> {
        let db = self.db_pool.as_ref();
        let mut query = InventoryRecord::find()
            .select_only()
            .column(inventory_record::Column::InvTypeCode)
            .column(inventory_record::Column::HotelId)
            .distinct();
        if let Some(hotel_id) = hotel_id {
            query = query.filter(inventory_record::Column::HotelId.eq(hotel_id));
        }
        let with_inventory: Vec<(String, String)> = query
            .order_by_asc(inventory_record::Column::HotelId)
            .order_by_asc(inventory_record::Column::InvTypeCode)
            .into_tuple()
            .all(db)
            .await?;

        let registered: HashSet<(String, String)> = self
            .all(hotel_id)
            .await?
            .into_iter()
            .map(|room| (room.inv_type_code, room.hotel_id))
            .collect();

        Ok(with_inventory
            .into_iter()
            .filter(|key| registered.contains(key))
            .collect())
    }
}

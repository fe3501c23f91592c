use crate::{
    db::DbPool,
    entities::{
        api_call_log::{self, Entity as ApiCallLog},
        inventory_record::{self, Entity as InventoryRecord},
    },
    errors::ServiceError,
    services::{
        channel_manager::{AvailabilityDay, InventorySource},
        room_types::RoomTypeService,
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, EntityTrait, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

/// Result of fetching one room type from the channel manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FetchOutcome {
    pub inv_type_code: String,
    pub hotel_id: String,
    pub success: bool,
    pub records_stored: usize,
    pub message: String,
}

/// Audit entry for an upstream call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiCallView {
    pub id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `{hotel_id}-{inv_type_code}`
    pub target: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub called_at: DateTime<Utc>,
}

impl From<api_call_log::Model> for ApiCallView {
    fn from(model: api_call_log::Model) -> Self {
        Self {
            id: model.id,
            start_date: model.start_date,
            end_date: model.end_date,
            target: model.inv_type_code,
            success: model.success,
            error_message: model.error_message,
            called_at: model.called_at,
        }
    }
}

pub struct InventoryFetchService {
    db_pool: Arc<DbPool>,
    source: Arc<dyn InventorySource>,
    room_types: Arc<RoomTypeService>,
}

impl InventoryFetchService {
    pub fn new(
        db_pool: Arc<DbPool>,
        source: Arc<dyn InventorySource>,
        room_types: Arc<RoomTypeService>,
    ) -> Self {
        Self {
            db_pool,
            source,
            room_types,
        }
    }

    /// Fetches a date range for one room type and upserts it.
    ///
    /// Exactly one audit row is appended per call, whatever the outcome.
    #[instrument(skip(self))]
    pub async fn fetch_room_type(
        &self,
        inv_type_code: &str,
        hotel_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchOutcome, ServiceError> {
        if start > end {
            return Err(ServiceError::ValidationError(format!(
                "start_date {} is after end_date {}",
                start, end
            )));
        }

        let result = match self
            .source
            .fetch_availability(hotel_id, inv_type_code, start, end)
            .await
        {
            Ok(days) => self.store_days(inv_type_code, hotel_id, days).await,
            Err(e) => Err(e),
        };

        let error_message = result.as_ref().err().map(|e| e.to_string());
        self.log_call(inv_type_code, hotel_id, start, end, error_message)
            .await?;

        match result {
            Ok(stored) => {
                info!(inv_type_code, hotel_id, stored, "Inventory fetched");
                let message = if stored == 0 {
                    format!("No availability returned for {}", inv_type_code)
                } else {
                    format!("Data fetched and stored for {}", inv_type_code)
                };
                Ok(FetchOutcome {
                    inv_type_code: inv_type_code.to_string(),
                    hotel_id: hotel_id.to_string(),
                    success: true,
                    records_stored: stored,
                    message,
                })
            }
            Err(e) => {
                counter!("hotel_inventory.fetch.failures", 1);
                error!(inv_type_code, hotel_id, error = %e, "Inventory fetch failed");
                Err(e)
            }
        }
    }

    async fn store_days(
        &self,
        inv_type_code: &str,
        hotel_id: &str,
        days: Vec<AvailabilityDay>,
    ) -> Result<usize, ServiceError> {
        if days.is_empty() {
            return Ok(0);
        }

        let db = self.db_pool.as_ref();
        let code = inv_type_code.to_string();
        let hotel = hotel_id.to_string();

        db.transaction::<_, usize, ServiceError>(move |txn| {
            Box::pin(async move {
                let stored = days.len();
                for day in days {
                    let record = inventory_record::ActiveModel {
                        inv_type_code: Set(code.clone()),
                        hotel_id: Set(hotel.clone()),
                        date: Set(day.date),
                        quantity: Set(day.quantity),
                        status: Set(day.status),
                        ..Default::default()
                    };
                    InventoryRecord::insert(record)
                        .on_conflict(
                            OnConflict::columns([
                                inventory_record::Column::InvTypeCode,
                                inventory_record::Column::Date,
                                inventory_record::Column::HotelId,
                            ])
                            .update_columns([
                                inventory_record::Column::Quantity,
                                inventory_record::Column::Status,
                            ])
                            .to_owned(),
                        )
                        .exec_without_returning(txn)
                        .await?;
                }
                Ok(stored)
            })
        })
        .await
        .map_err(ServiceError::from)
    }

    async fn log_call(
        &self,
        inv_type_code: &str,
        hotel_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        error_message: Option<String>,
    ) -> Result<(), ServiceError> {
        let entry = api_call_log::ActiveModel {
            start_date: Set(start),
            end_date: Set(end),
            inv_type_code: Set(format!("{}-{}", hotel_id, inv_type_code)),
            success: Set(error_message.is_none()),
            error_message: Set(error_message),
            called_at: Set(Utc::now()),
            ..Default::default()
        };
        entry.insert(self.db_pool.as_ref()).await?;
        Ok(())
    }

    /// Fetches every room type (optionally of one hotel), one after another.
    ///
    /// Individual failures become `success = false` outcomes.
    #[instrument(skip(self))]
    pub async fn fetch_all(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        hotel_id: Option<&str>,
    ) -> Result<Vec<FetchOutcome>, ServiceError> {
        if start > end {
            return Err(ServiceError::ValidationError(format!(
                "start_date {} is after end_date {}",
                start, end
            )));
        }

        let room_types = self.room_types.all(hotel_id).await?;
        let mut outcomes = Vec::with_capacity(room_types.len());

        for room_type in room_types {
            let outcome = match self
                .fetch_room_type(&room_type.inv_type_code, &room_type.hotel_id, start, end)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(
                        inv_type_code = %room_type.inv_type_code,
                        hotel_id = %room_type.hotel_id,
                        error = %e,
                        "Continuing after fetch failure"
                    );
                    FetchOutcome {
                        inv_type_code: room_type.inv_type_code,
                        hotel_id: room_type.hotel_id,
                        success: false,
                        records_stored: 0,
                        message: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// Most recent upstream calls, newest first
    pub async fn list_api_calls(&self, limit: u64) -> Result<Vec<ApiCallView>, ServiceError> {
        let rows = ApiCallLog::find()
            .order_by_desc(api_call_log::Column::CalledAt)
            .order_by_desc(api_call_log::Column::Id)
            .limit(limit)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(rows.into_iter().map(ApiCallView::from).collect())
    }
}

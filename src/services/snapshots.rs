use crate::{
    db::DbPool,
    entities::{
        data_snapshot::{self, Entity as DataSnapshot, SnapshotStatus},
        inventory_record, inventory_snapshot,
        weekly_statistics, weekly_statistics_snapshot,
    },
    errors::ServiceError,
};
use chrono::{DateTime, Local, NaiveDate, Utc};
use sea_orm::{
    sea_query::{Expr, Query},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

const SNAPSHOT_CREATOR: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SnapshotCreated {
    pub snapshot_id: i32,
    /// False when the snapshot for that day already existed
    pub created: bool,
}

/// Snapshot metadata plus figures derived from its statistics rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SnapshotSummary {
    pub id: i32,
    pub snapshot_date: NaiveDate,
    pub snapshot_time: DateTime<Utc>,
    pub description: Option<String>,
    pub status: SnapshotStatus,
    pub total_records: i32,
    pub created_by: String,
    pub room_types_count: usize,
    pub hotels_count: usize,
    pub earliest_week: Option<NaiveDate>,
    pub latest_week: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SnapshotDeleted {
    pub snapshot_id: i32,
    pub inventory_rows: u64,
    pub statistics_rows: u64,
}

type StatsKey = (i32, String, String, NaiveDate);

fn summarize(snapshot: data_snapshot::Model, rows: &[&StatsKey]) -> SnapshotSummary {
    let room_types: BTreeSet<(&str, &str)> = rows
        .iter()
        .map(|(_, code, hotel, _)| (code.as_str(), hotel.as_str()))
        .collect();
    let hotels: BTreeSet<&str> = rows.iter().map(|(_, _, hotel, _)| hotel.as_str()).collect();

    SnapshotSummary {
        id: snapshot.id,
        snapshot_date: snapshot.snapshot_date,
        snapshot_time: snapshot.snapshot_time,
        description: snapshot.description,
        status: snapshot.status,
        total_records: snapshot.total_records,
        created_by: snapshot.created_by,
        room_types_count: room_types.len(),
        hotels_count: hotels.len(),
        earliest_week: rows.iter().map(|(_, _, _, week)| *week).min(),
        latest_week: rows.iter().map(|(_, _, _, week)| *week).max(),
    }
}

pub struct SnapshotService {
    db_pool: Arc<DbPool>,
}

impl SnapshotService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Snapshot of the current local calendar day
    pub async fn create_snapshot(
        &self,
        description: Option<String>,
    ) -> Result<SnapshotCreated, ServiceError> {
        self.create_snapshot_for_date(Local::now().date_naive(), description)
            .await
    }

    /// Copies inventory and weekly statistics into a snapshot dated `snapshot_date`.
    ///
    /// Idempotent per day: an existing snapshot for that date is returned as is.
    #[instrument(skip(self))]
    pub async fn create_snapshot_for_date(
        &self,
        snapshot_date: NaiveDate,
        description: Option<String>,
    ) -> Result<SnapshotCreated, ServiceError> {
        if let Some(existing) = self.find_by_date(snapshot_date).await? {
            info!(snapshot_id = existing.id, %snapshot_date, "Snapshot already exists for date");
            return Ok(SnapshotCreated {
                snapshot_id: existing.id,
                created: false,
            });
        }

        let description =
            description.unwrap_or_else(|| format!("Automatic snapshot - {}", snapshot_date));
        let db = self.db_pool.as_ref();

        let result = db
            .transaction::<_, (i32, u64), ServiceError>(move |txn| {
                Box::pin(async move {
                    let snapshot = data_snapshot::ActiveModel {
                        snapshot_date: Set(snapshot_date),
                        snapshot_time: Set(Utc::now()),
                        description: Set(Some(description)),
                        status: Set(SnapshotStatus::Processing),
                        total_records: Set(0),
                        created_by: Set(SNAPSHOT_CREATOR.to_string()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    let inventory_rows = copy_inventory(txn, snapshot.id).await?;
                    let statistics_rows = copy_statistics(txn, snapshot.id).await?;
                    let total = inventory_rows + statistics_rows;

                    let snapshot_id = snapshot.id;
                    let mut completed: data_snapshot::ActiveModel = snapshot.into();
                    completed.status = Set(SnapshotStatus::Completed);
                    completed.total_records = Set(record_count(total)?);
                    completed.update(txn).await?;

                    Ok((snapshot_id, total))
                })
            })
            .await
            .map_err(ServiceError::from);

        match result {
            Ok((snapshot_id, total_records)) => {
                info!(snapshot_id, total_records, %snapshot_date, "Snapshot created");
                Ok(SnapshotCreated {
                    snapshot_id,
                    created: true,
                })
            }
            Err(e) if e.is_unique_violation() => {
                warn!(%snapshot_date, "Concurrent snapshot creation, returning existing snapshot");
                let existing = self.find_by_date(snapshot_date).await?.ok_or(e)?;
                Ok(SnapshotCreated {
                    snapshot_id: existing.id,
                    created: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn find_by_date(
        &self,
        snapshot_date: NaiveDate,
    ) -> Result<Option<data_snapshot::Model>, ServiceError> {
        Ok(DataSnapshot::find()
            .filter(data_snapshot::Column::SnapshotDate.eq(snapshot_date))
            .one(self.db_pool.as_ref())
            .await?)
    }

    async fn statistics_keys(&self, snapshot_ids: Vec<i32>) -> Result<Vec<StatsKey>, ServiceError> {
        if snapshot_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(weekly_statistics_snapshot::Entity::find()
            .select_only()
            .column(weekly_statistics_snapshot::Column::SnapshotId)
            .column(weekly_statistics_snapshot::Column::InvTypeCode)
            .column(weekly_statistics_snapshot::Column::HotelId)
            .column(weekly_statistics_snapshot::Column::WeekStartDate)
            .filter(weekly_statistics_snapshot::Column::SnapshotId.is_in(snapshot_ids))
            .into_tuple()
            .all(self.db_pool.as_ref())
            .await?)
    }

    /// Newest snapshots first
    #[instrument(skip(self))]
    pub async fn list(&self, limit: u64) -> Result<Vec<SnapshotSummary>, ServiceError> {
        let snapshots = DataSnapshot::find()
            .order_by_desc(data_snapshot::Column::SnapshotDate)
            .limit(limit)
            .all(self.db_pool.as_ref())
            .await?;

        let keys = self
            .statistics_keys(snapshots.iter().map(|s| s.id).collect())
            .await?;
        let mut by_snapshot: HashMap<i32, Vec<&StatsKey>> = HashMap::new();
        for key in &keys {
            by_snapshot.entry(key.0).or_default().push(key);
        }

        Ok(snapshots
            .into_iter()
            .map(|snapshot| {
                let rows = by_snapshot.get(&snapshot.id).cloned().unwrap_or_default();
                summarize(snapshot, &rows)
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, snapshot_id: i32) -> Result<SnapshotSummary, ServiceError> {
        let snapshot = DataSnapshot::find_by_id(snapshot_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("snapshot {}", snapshot_id)))?;

        let keys = self.statistics_keys(vec![snapshot_id]).await?;
        let rows: Vec<&StatsKey> = keys.iter().collect();
        Ok(summarize(snapshot, &rows))
    }

    /// Deletes a snapshot together with its copied rows
    #[instrument(skip(self))]
    pub async fn delete(&self, snapshot_id: i32) -> Result<SnapshotDeleted, ServiceError> {
        let deleted = self
            .db_pool
            .transaction::<_, SnapshotDeleted, ServiceError>(move |txn| {
                Box::pin(async move {
                    DataSnapshot::find_by_id(snapshot_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| ServiceError::NotFound(format!("snapshot {}", snapshot_id)))?;

                    let inventory_rows = inventory_snapshot::Entity::delete_many()
                        .filter(inventory_snapshot::Column::SnapshotId.eq(snapshot_id))
                        .exec(txn)
                        .await?
                        .rows_affected;
                    let statistics_rows = weekly_statistics_snapshot::Entity::delete_many()
                        .filter(weekly_statistics_snapshot::Column::SnapshotId.eq(snapshot_id))
                        .exec(txn)
                        .await?
                        .rows_affected;
                    DataSnapshot::delete_by_id(snapshot_id).exec(txn).await?;

                    Ok(SnapshotDeleted {
                        snapshot_id,
                        inventory_rows,
                        statistics_rows,
                    })
                })
            })
            .await?;

        info!(
            snapshot_id,
            inventory_rows = deleted.inventory_rows,
            statistics_rows = deleted.statistics_rows,
            "Snapshot deleted"
        );
        Ok(deleted)
    }
}

/// Copied row count as stored on the snapshot; overflow aborts the snapshot
fn record_count(total: u64) -> Result<i32, ServiceError> {
    i32::try_from(total).map_err(|_| {
        ServiceError::InternalError(format!("snapshot copied {} rows, more than can be recorded", total))
    })
}

/// `INSERT INTO inventory_snapshots (...) SELECT <id>, ... FROM inventory_data`
async fn copy_inventory(txn: &DatabaseTransaction, snapshot_id: i32) -> Result<u64, ServiceError> {
    let select = Query::select()
        .expr(Expr::val(snapshot_id))
        .columns([
            inventory_record::Column::InvTypeCode,
            inventory_record::Column::HotelId,
            inventory_record::Column::Date,
            inventory_record::Column::Quantity,
            inventory_record::Column::Status,
        ])
        .from(inventory_record::Entity)
        .to_owned();

    let mut insert = Query::insert();
    insert
        .into_table(inventory_snapshot::Entity)
        .columns([
            inventory_snapshot::Column::SnapshotId,
            inventory_snapshot::Column::InvTypeCode,
            inventory_snapshot::Column::HotelId,
            inventory_snapshot::Column::Date,
            inventory_snapshot::Column::Quantity,
            inventory_snapshot::Column::Status,
        ])
        .select_from(select)
        .map_err(|e| ServiceError::InternalError(format!("invalid snapshot query: {}", e)))?;

    let backend = txn.get_database_backend();
    Ok(txn.execute(backend.build(&insert)).await?.rows_affected())
}

async fn copy_statistics(txn: &DatabaseTransaction, snapshot_id: i32) -> Result<u64, ServiceError> {
    let select = Query::select()
        .expr(Expr::val(snapshot_id))
        .columns([
            weekly_statistics::Column::InvTypeCode,
            weekly_statistics::Column::HotelId,
            weekly_statistics::Column::WeekStartDate,
            weekly_statistics::Column::WeekEndDate,
            weekly_statistics::Column::ActualOccupancyRate,
            weekly_statistics::Column::ActualVacancyRate,
            weekly_statistics::Column::TotalOccupancyRate,
            weekly_statistics::Column::TotalVacancyRate,
            weekly_statistics::Column::TotalRooms,
            weekly_statistics::Column::TotalAvailableDays,
            weekly_statistics::Column::TotalDays,
        ])
        .from(weekly_statistics::Entity)
        .to_owned();

    let mut insert = Query::insert();
    insert
        .into_table(weekly_statistics_snapshot::Entity)
        .columns([
            weekly_statistics_snapshot::Column::SnapshotId,
            weekly_statistics_snapshot::Column::InvTypeCode,
            weekly_statistics_snapshot::Column::HotelId,
            weekly_statistics_snapshot::Column::WeekStartDate,
            weekly_statistics_snapshot::Column::WeekEndDate,
            weekly_statistics_snapshot::Column::ActualOccupancyRate,
            weekly_statistics_snapshot::Column::ActualVacancyRate,
            weekly_statistics_snapshot::Column::TotalOccupancyRate,
            weekly_statistics_snapshot::Column::TotalVacancyRate,
            weekly_statistics_snapshot::Column::TotalRooms,
            weekly_statistics_snapshot::Column::TotalAvailableDays,
            weekly_statistics_snapshot::Column::TotalDays,
        ])
        .select_from(select)
        .map_err(|e| ServiceError::InternalError(format!("invalid snapshot query: {}", e)))?;

    let backend = txn.get_database_backend();
    Ok(txn.execute(backend.build(&insert)).await?.rows_affected())
}

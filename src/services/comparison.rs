use crate::{
    db::DbPool,
    entities::{
        data_snapshot::{self, Entity as DataSnapshot, SnapshotStatus},
        weekly_statistics_snapshot,
    },
    errors::ServiceError,
    services::{hotels::HotelDirectory, round2},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Number of changes surfaced per period by the weekly trend view
const KEY_CHANGES_PER_PERIOD: usize = 5;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeType {
    Changed,
    New,
    Removed,
}

/// Actual occupancy of one (room type, hotel, week) inside a snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyPoint {
    pub inv_type_code: String,
    pub hotel_id: String,
    pub week_start_date: NaiveDate,
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OccupancyChange {
    pub inv_type_code: String,
    pub hotel_id: String,
    pub hotel_name: String,
    pub week_start_date: NaiveDate,
    pub from_occupancy: Option<f64>,
    pub to_occupancy: Option<f64>,
    /// Present only for `changed` rows
    pub occupancy_diff: Option<f64>,
    pub change_type: ChangeType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ComparisonSummary {
    pub total_changes: usize,
    pub new_records: usize,
    pub removed_records: usize,
    pub modified_records: usize,
    pub biggest_increase: Option<OccupancyChange>,
    pub biggest_decrease: Option<OccupancyChange>,
}

type PointKey = (String, String, NaiveDate);

/// Full outer join of two snapshots keyed by (code, hotel, week); unchanged keys are dropped
pub fn diff_occupancy(
    from: &[OccupancyPoint],
    to: &[OccupancyPoint],
    hotels: &HotelDirectory,
) -> Vec<OccupancyChange> {
    let index = |points: &[OccupancyPoint]| -> BTreeMap<PointKey, f64> {
        points
            .iter()
            .map(|p| {
                (
                    (p.inv_type_code.clone(), p.hotel_id.clone(), p.week_start_date),
                    p.occupancy_rate,
                )
            })
            .collect()
    };
    let from_index = index(from);
    let mut to_index = index(to);

    let mut changes = Vec::new();
    for (key, from_rate) in from_index {
        let (change_type, to_rate, diff) = match to_index.remove(&key) {
            Some(to_rate) => {
                let diff = round2(to_rate - from_rate);
                if diff == 0.0 {
                    continue;
                }
                (ChangeType::Changed, Some(to_rate), Some(diff))
            }
            None => (ChangeType::Removed, None, None),
        };
        changes.push(change_row(key, Some(from_rate), to_rate, diff, change_type, hotels));
    }
    for (key, to_rate) in to_index {
        changes.push(change_row(key, None, Some(to_rate), None, ChangeType::New, hotels));
    }

    changes.sort_by(|a, b| {
        a.change_type
            .cmp(&b.change_type)
            .then_with(|| a.inv_type_code.cmp(&b.inv_type_code))
            .then_with(|| a.hotel_id.cmp(&b.hotel_id))
            .then_with(|| a.week_start_date.cmp(&b.week_start_date))
    });
    changes
}

fn change_row(
    (inv_type_code, hotel_id, week_start_date): PointKey,
    from_occupancy: Option<f64>,
    to_occupancy: Option<f64>,
    occupancy_diff: Option<f64>,
    change_type: ChangeType,
    hotels: &HotelDirectory,
) -> OccupancyChange {
    OccupancyChange {
        hotel_name: hotels.name_for(&hotel_id),
        inv_type_code,
        hotel_id,
        week_start_date,
        from_occupancy,
        to_occupancy,
        occupancy_diff,
        change_type,
    }
}

pub fn summarize(changes: &[OccupancyChange]) -> ComparisonSummary {
    let count = |kind: ChangeType| changes.iter().filter(|c| c.change_type == kind).count();
    let diffs = || {
        changes
            .iter()
            .filter(|c| c.change_type == ChangeType::Changed)
            .filter_map(|c| c.occupancy_diff.map(|d| (d, c)))
    };

    let biggest_increase = diffs()
        .filter(|(d, _)| *d > 0.0)
        .max_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, c)| c.clone());
    let biggest_decrease = diffs()
        .filter(|(d, _)| *d < 0.0)
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, c)| c.clone());

    ComparisonSummary {
        total_changes: changes.len(),
        new_records: count(ChangeType::New),
        removed_records: count(ChangeType::Removed),
        modified_records: count(ChangeType::Changed),
        biggest_increase,
        biggest_decrease,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SnapshotRef {
    pub id: i32,
    pub snapshot_date: NaiveDate,
    pub snapshot_time: DateTime<Utc>,
    pub description: Option<String>,
    pub total_records: i32,
}

impl From<data_snapshot::Model> for SnapshotRef {
    fn from(model: data_snapshot::Model) -> Self {
        Self {
            id: model.id,
            snapshot_date: model.snapshot_date,
            snapshot_time: model.snapshot_time,
            description: model.description,
            total_records: model.total_records,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ComparisonPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SnapshotComparison {
    pub period: ComparisonPeriod,
    pub from_snapshot: SnapshotRef,
    pub to_snapshot: SnapshotRef,
    pub summary: ComparisonSummary,
    pub changes: Vec<OccupancyChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeeklyChangePeriod {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub summary: ComparisonSummary,
    pub key_changes: Vec<OccupancyChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeeklyChanges {
    pub weeks_requested: u64,
    pub hotel_id: Option<String>,
    pub weeks_analyzed: usize,
    pub available_snapshots: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub periods: Vec<WeeklyChangePeriod>,
}

pub struct ComparisonService {
    db_pool: Arc<DbPool>,
    hotels: HotelDirectory,
}

impl ComparisonService {
    pub fn new(db_pool: Arc<DbPool>, hotels: HotelDirectory) -> Self {
        Self { db_pool, hotels }
    }

    async fn completed_snapshot(&self, date: NaiveDate) -> Result<data_snapshot::Model, ServiceError> {
        DataSnapshot::find()
            .filter(data_snapshot::Column::SnapshotDate.eq(date))
            .filter(data_snapshot::Column::Status.eq(SnapshotStatus::Completed))
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("no completed snapshot for {}", date)))
    }

    async fn points(
        &self,
        snapshot_id: i32,
        hotel_id: Option<&str>,
    ) -> Result<Vec<OccupancyPoint>, ServiceError> {
        let mut query = weekly_statistics_snapshot::Entity::find()
            .select_only()
            .column(weekly_statistics_snapshot::Column::InvTypeCode)
            .column(weekly_statistics_snapshot::Column::HotelId)
            .column(weekly_statistics_snapshot::Column::WeekStartDate)
            .column(weekly_statistics_snapshot::Column::ActualOccupancyRate)
            .filter(weekly_statistics_snapshot::Column::SnapshotId.eq(snapshot_id));
        if let Some(hotel_id) = hotel_id {
            query = query.filter(weekly_statistics_snapshot::Column::HotelId.eq(hotel_id));
        }

        let rows: Vec<(String, String, NaiveDate, f64)> =
            query.into_tuple().all(self.db_pool.as_ref()).await?;
        Ok(rows
            .into_iter()
            .map(
                |(inv_type_code, hotel_id, week_start_date, occupancy_rate)| OccupancyPoint {
                    inv_type_code,
                    hotel_id,
                    week_start_date,
                    occupancy_rate,
                },
            )
            .collect())
    }

    async fn diff_snapshots(
        &self,
        from: &data_snapshot::Model,
        to: &data_snapshot::Model,
        hotel_id: Option<&str>,
    ) -> Result<Vec<OccupancyChange>, ServiceError> {
        let from_points = self.points(from.id, hotel_id).await?;
        let to_points = self.points(to.id, hotel_id).await?;
        Ok(diff_occupancy(&from_points, &to_points, &self.hotels))
    }

    /// Compares the completed snapshots taken on two dates
    #[instrument(skip(self))]
    pub async fn compare_snapshots(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<SnapshotComparison, ServiceError> {
        let from_snapshot = self.completed_snapshot(from_date).await?;
        let to_snapshot = self.completed_snapshot(to_date).await?;

        let changes = self
            .diff_snapshots(&from_snapshot, &to_snapshot, None)
            .await?;
        let summary = summarize(&changes);
        info!(
            %from_date,
            %to_date,
            total_changes = summary.total_changes,
            "Snapshots compared"
        );

        Ok(SnapshotComparison {
            period: ComparisonPeriod {
                from: from_date,
                to: to_date,
            },
            from_snapshot: from_snapshot.into(),
            to_snapshot: to_snapshot.into(),
            summary,
            changes,
        })
    }

    /// Compares each consecutive pair among the newest `weeks + 1` completed snapshots
    #[instrument(skip(self))]
    pub async fn weekly_changes(
        &self,
        weeks: u64,
        hotel_id: Option<&str>,
    ) -> Result<WeeklyChanges, ServiceError> {
        let mut snapshots = DataSnapshot::find()
            .filter(data_snapshot::Column::Status.eq(SnapshotStatus::Completed))
            .order_by_desc(data_snapshot::Column::SnapshotDate)
            .limit(weeks + 1)
            .all(self.db_pool.as_ref())
            .await?;
        snapshots.reverse();

        let mut result = WeeklyChanges {
            weeks_requested: weeks,
            hotel_id: hotel_id.map(str::to_string),
            weeks_analyzed: 0,
            available_snapshots: snapshots.len(),
            message: None,
            periods: Vec::new(),
        };

        if snapshots.len() < 2 {
            result.message =
                Some("Not enough snapshots to compare; at least two are required".to_string());
            return Ok(result);
        }

        for pair in snapshots.windows(2) {
            let (older, newer) = (&pair[0], &pair[1]);
            let changes = self.diff_snapshots(older, newer, hotel_id).await?;
            let summary = summarize(&changes);
            result.periods.push(WeeklyChangePeriod {
                from_date: older.snapshot_date,
                to_date: newer.snapshot_date,
                summary,
                key_changes: changes.into_iter().take(KEY_CHANGES_PER_PERIOD).collect(),
            });
        }
        // Newest period first
        result.periods.reverse();
        result.weeks_analyzed = result.periods.len();

        Ok(result)
    }
}

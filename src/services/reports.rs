use crate::{
    db::DbPool,
    entities::{
        data_snapshot::{self, Entity as DataSnapshot, SnapshotStatus},
        inventory_record::{self, Entity as InventoryRecord},
        room_type::{self, Entity as RoomType},
        weekly_statistics::{self, Entity as WeeklyStatistics},
    },
    errors::ServiceError,
    services::{
        comparison::SnapshotRef, hotels::HotelDirectory, room_types::RoomTypeView, round2,
        weekly_update::week_monday,
    },
};
use chrono::{Duration, NaiveDate};
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

/// Number of room types listed in the dashboard overview
const OVERVIEW_SIZE: usize = 10;

fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Average actual occupancy of one room type over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoomTypeOccupancy {
    pub inv_type_code: String,
    pub hotel_id: String,
    pub hotel_name: String,
    pub avg_occupancy: f64,
    pub weeks_count: usize,
}

/// Groups (code, hotel, rate) rows per room type, best average first
pub fn average_by_room_type(
    rows: &[(String, String, f64)],
    hotels: &HotelDirectory,
) -> Vec<RoomTypeOccupancy> {
    let mut grouped: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
    for (code, hotel, rate) in rows {
        grouped
            .entry((code.as_str(), hotel.as_str()))
            .or_default()
            .push(*rate);
    }

    let mut averages: Vec<RoomTypeOccupancy> = grouped
        .into_iter()
        .map(|((code, hotel), rates)| RoomTypeOccupancy {
            inv_type_code: code.to_string(),
            hotel_id: hotel.to_string(),
            hotel_name: hotels.name_for(hotel),
            avg_occupancy: round2(mean(rates.iter().copied())),
            weeks_count: rates.len(),
        })
        .collect();
    averages.sort_by(|a, b| b.avg_occupancy.total_cmp(&a.avg_occupancy));
    averages
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummary {
    pub hotel_id: Option<String>,
    pub total_hotels: u64,
    pub total_room_types: u64,
    pub avg_occupancy_rate: f64,
    /// Monday from which weekly statistics are considered
    pub data_period_start: NaiveDate,
    pub best_performer: Option<RoomTypeOccupancy>,
    pub worst_performer: Option<RoomTypeOccupancy>,
    pub latest_snapshot: Option<SnapshotRef>,
    pub room_types_overview: Vec<RoomTypeOccupancy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrendPoint {
    pub week_start_date: NaiveDate,
    pub week_end_date: NaiveDate,
    pub actual_occupancy_rate: f64,
    pub actual_vacancy_rate: f64,
    pub total_occupancy_rate: f64,
    pub total_vacancy_rate: f64,
    pub total_rooms: i32,
    pub total_available_days: i32,
}

impl From<weekly_statistics::Model> for TrendPoint {
    fn from(row: weekly_statistics::Model) -> Self {
        Self {
            week_start_date: row.week_start_date,
            week_end_date: row.week_end_date,
            actual_occupancy_rate: row.actual_occupancy_rate,
            actual_vacancy_rate: row.actual_vacancy_rate,
            total_occupancy_rate: row.total_occupancy_rate,
            total_vacancy_rate: row.total_vacancy_rate,
            total_rooms: row.total_rooms,
            total_available_days: row.total_available_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeekRate {
    pub week_start_date: NaiveDate,
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrendInsights {
    pub trend_direction: TrendDirection,
    pub occupancy_change: f64,
    pub peak_week: Option<WeekRate>,
    pub lowest_week: Option<WeekRate>,
    pub average_occupancy: f64,
}

/// Insights over weekly points ordered newest first
pub fn trend_insights(points: &[TrendPoint]) -> TrendInsights {
    let (latest, previous) = match points {
        [latest, previous, ..] => (latest, previous),
        _ => {
            return TrendInsights {
                trend_direction: TrendDirection::InsufficientData,
                occupancy_change: 0.0,
                peak_week: None,
                lowest_week: None,
                average_occupancy: points.first().map_or(0.0, |p| p.actual_occupancy_rate),
            }
        }
    };

    let occupancy_change = round2(latest.actual_occupancy_rate - previous.actual_occupancy_rate);
    let trend_direction = if occupancy_change > 0.0 {
        TrendDirection::Up
    } else if occupancy_change < 0.0 {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    let week_rate = |p: &TrendPoint| WeekRate {
        week_start_date: p.week_start_date,
        occupancy_rate: round2(p.actual_occupancy_rate),
    };
    let peak_week = points
        .iter()
        .max_by(|a, b| a.actual_occupancy_rate.total_cmp(&b.actual_occupancy_rate))
        .map(week_rate);
    let lowest_week = points
        .iter()
        .min_by(|a, b| a.actual_occupancy_rate.total_cmp(&b.actual_occupancy_rate))
        .map(week_rate);

    TrendInsights {
        trend_direction,
        occupancy_change,
        peak_week,
        lowest_week,
        average_occupancy: round2(mean(points.iter().map(|p| p.actual_occupancy_rate))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoomTypeTrends {
    pub room_type: RoomTypeView,
    pub weeks: u64,
    pub data_points: Vec<TrendPoint>,
    pub insights: TrendInsights,
}

/// One inventory day joined with its room type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalesRow {
    pub date: NaiveDate,
    pub inv_type_code: String,
    pub hotel_id: String,
    pub hotel_name: String,
    pub room_type_name: String,
    pub total_rooms: i32,
    pub available_rooms: i32,
    pub sold_rooms: i32,
    pub status: String,
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailySales {
    pub date: NaiveDate,
    pub total_rooms: i64,
    pub sold_rooms: i64,
    pub available_rooms: i64,
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalesSummary {
    pub total_rooms: i64,
    pub total_sold: i64,
    pub total_available: i64,
    pub avg_occupancy_rate: f64,
    pub total_days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoomTypePerformance {
    pub inv_type_code: String,
    pub hotel_id: String,
    pub hotel_name: String,
    pub room_type_name: String,
    pub avg_sold_rooms: f64,
    pub avg_total_rooms: f64,
    pub avg_occupancy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalesPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalesStatus {
    pub period: SalesPeriod,
    pub summary: SalesSummary,
    pub daily_data: Vec<DailySales>,
    pub detailed_data: Vec<SalesRow>,
    pub room_type_performance: Vec<RoomTypePerformance>,
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        round2(part / whole * 100.0)
    } else {
        0.0
    }
}

/// Builds the sales report from joined rows ordered by date desc, hotel, code
pub fn aggregate_sales(period: SalesPeriod, rows: Vec<SalesRow>) -> SalesStatus {
    let mut daily: BTreeMap<NaiveDate, (i64, i64, i64)> = BTreeMap::new();
    let mut per_room_type: BTreeMap<(String, String), (String, String, Vec<&SalesRow>)> =
        BTreeMap::new();
    let (mut total_rooms, mut total_sold, mut total_available) = (0i64, 0i64, 0i64);

    for row in &rows {
        let day = daily.entry(row.date).or_default();
        day.0 += i64::from(row.total_rooms);
        day.1 += i64::from(row.sold_rooms);
        day.2 += i64::from(row.available_rooms);

        total_rooms += i64::from(row.total_rooms);
        total_sold += i64::from(row.sold_rooms);
        total_available += i64::from(row.available_rooms);

        per_room_type
            .entry((row.inv_type_code.clone(), row.hotel_id.clone()))
            .or_insert_with(|| (row.hotel_name.clone(), row.room_type_name.clone(), Vec::new()))
            .2
            .push(row);
    }

    let mut room_type_performance: Vec<RoomTypePerformance> = per_room_type
        .into_iter()
        .map(
            |((inv_type_code, hotel_id), (hotel_name, room_type_name, days))| RoomTypePerformance {
                inv_type_code,
                hotel_id,
                hotel_name,
                room_type_name,
                avg_sold_rooms: round2(mean(days.iter().map(|d| f64::from(d.sold_rooms)))),
                avg_total_rooms: round2(mean(days.iter().map(|d| f64::from(d.total_rooms)))),
                avg_occupancy_rate: round2(mean(days.iter().map(|d| d.occupancy_rate))),
            },
        )
        .collect();
    room_type_performance.sort_by(|a, b| b.avg_occupancy_rate.total_cmp(&a.avg_occupancy_rate));

    let daily_data: Vec<DailySales> = daily
        .into_iter()
        .map(|(date, (total, sold, available))| DailySales {
            date,
            total_rooms: total,
            sold_rooms: sold,
            available_rooms: available,
            occupancy_rate: percentage(sold as f64, total as f64),
        })
        .collect();

    SalesStatus {
        period,
        summary: SalesSummary {
            total_rooms,
            total_sold,
            total_available,
            avg_occupancy_rate: percentage(total_sold as f64, total_rooms as f64),
            total_days: daily_data.len(),
        },
        daily_data,
        room_type_performance,
        detailed_data: rows,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeeklyOccupancyTrend {
    pub week_start_date: NaiveDate,
    pub avg_occupancy: f64,
    pub room_types_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HeatmapCell {
    pub inv_type_code: String,
    pub hotel_id: String,
    pub hotel_name: String,
    pub week_start_date: NaiveDate,
    pub actual_occupancy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HotelComparison {
    pub hotel_id: String,
    pub hotel_name: String,
    pub avg_occupancy: f64,
    pub total_weeks: usize,
    pub room_types_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartMetadata {
    pub weeks: u64,
    pub hotel_id: Option<String>,
    pub since: NaiveDate,
    pub data_points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardCharts {
    pub occupancy_trends: Vec<WeeklyOccupancyTrend>,
    pub room_performance_heatmap: Vec<HeatmapCell>,
    pub hotel_comparison: Vec<HotelComparison>,
    pub metadata: ChartMetadata,
}

pub struct ReportService {
    db_pool: Arc<DbPool>,
    hotels: HotelDirectory,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>, hotels: HotelDirectory) -> Self {
        Self { db_pool, hotels }
    }

    /// Headline figures for the dashboard landing page
    #[instrument(skip(self))]
    pub async fn dashboard_summary(
        &self,
        hotel_id: Option<&str>,
        today: NaiveDate,
    ) -> Result<DashboardSummary, ServiceError> {
        let db = self.db_pool.as_ref();

        let mut room_types = RoomType::find();
        if let Some(hotel_id) = hotel_id {
            room_types = room_types.filter(room_type::Column::HotelId.eq(hotel_id));
        }
        let total_room_types = room_types.count(db).await?;

        let total_hotels = match hotel_id {
            Some(_) => 1,
            None => RoomType::find()
                .select_only()
                .column(room_type::Column::HotelId)
                .distinct()
                .into_tuple::<String>()
                .all(db)
                .await?
                .len() as u64,
        };

        let latest_snapshot = DataSnapshot::find()
            .filter(data_snapshot::Column::Status.eq(SnapshotStatus::Completed))
            .order_by_desc(data_snapshot::Column::SnapshotDate)
            .one(db)
            .await?
            .map(SnapshotRef::from);

        let current_monday = week_monday(today);
        let mut stats = WeeklyStatistics::find()
            .select_only()
            .column(weekly_statistics::Column::InvTypeCode)
            .column(weekly_statistics::Column::HotelId)
            .column(weekly_statistics::Column::ActualOccupancyRate)
            .filter(weekly_statistics::Column::WeekStartDate.gte(current_monday));
        if let Some(hotel_id) = hotel_id {
            stats = stats.filter(weekly_statistics::Column::HotelId.eq(hotel_id));
        }
        let rows: Vec<(String, String, f64)> = stats.into_tuple().all(db).await?;

        let averages = average_by_room_type(&rows, &self.hotels);
        let avg_occupancy_rate = round2(mean(averages.iter().map(|a| a.avg_occupancy)));

        Ok(DashboardSummary {
            hotel_id: hotel_id.map(str::to_string),
            total_hotels,
            total_room_types,
            avg_occupancy_rate,
            data_period_start: current_monday,
            best_performer: averages.first().cloned(),
            worst_performer: averages.last().cloned(),
            latest_snapshot,
            room_types_overview: averages.into_iter().take(OVERVIEW_SIZE).collect(),
        })
    }

    /// Latest `weeks` statistics of one room type with derived insights
    #[instrument(skip(self))]
    pub async fn room_type_trends(
        &self,
        inv_type_code: &str,
        hotel_id: &str,
        weeks: u64,
    ) -> Result<RoomTypeTrends, ServiceError> {
        let db = self.db_pool.as_ref();

        let room_type = RoomType::find()
            .filter(room_type::Column::InvTypeCode.eq(inv_type_code))
            .filter(room_type::Column::HotelId.eq(hotel_id))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("room type {} (hotel {})", inv_type_code, hotel_id))
            })?;

        let data_points: Vec<TrendPoint> = WeeklyStatistics::find()
            .filter(weekly_statistics::Column::InvTypeCode.eq(inv_type_code))
            .filter(weekly_statistics::Column::HotelId.eq(hotel_id))
            .order_by_desc(weekly_statistics::Column::WeekStartDate)
            .limit(weeks)
            .all(db)
            .await?
            .into_iter()
            .map(TrendPoint::from)
            .collect();

        let insights = trend_insights(&data_points);
        Ok(RoomTypeTrends {
            room_type: RoomTypeView::from_model(room_type, &self.hotels),
            weeks,
            data_points,
            insights,
        })
    }

    /// Per-day sales detail with daily, overall and per room type aggregates
    #[instrument(skip(self))]
    pub async fn sales_status(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        hotel_id: Option<&str>,
        inv_type_code: Option<&str>,
    ) -> Result<SalesStatus, ServiceError> {
        if start_date > end_date {
            return Err(ServiceError::ValidationError(format!(
                "start_date {} is after end_date {}",
                start_date, end_date
            )));
        }
        let db = self.db_pool.as_ref();

        let mut inventory = InventoryRecord::find()
            .filter(inventory_record::Column::Date.between(start_date, end_date));
        let mut room_types = RoomType::find();
        if let Some(hotel_id) = hotel_id {
            inventory = inventory.filter(inventory_record::Column::HotelId.eq(hotel_id));
            room_types = room_types.filter(room_type::Column::HotelId.eq(hotel_id));
        }
        if let Some(inv_type_code) = inv_type_code {
            inventory = inventory.filter(inventory_record::Column::InvTypeCode.eq(inv_type_code));
            room_types = room_types.filter(room_type::Column::InvTypeCode.eq(inv_type_code));
        }

        let room_types: HashMap<(String, String), room_type::Model> = room_types
            .all(db)
            .await?
            .into_iter()
            .map(|rt| ((rt.inv_type_code.clone(), rt.hotel_id.clone()), rt))
            .collect();

        let rows: Vec<SalesRow> = inventory
            .order_by_desc(inventory_record::Column::Date)
            .order_by_asc(inventory_record::Column::HotelId)
            .order_by_asc(inventory_record::Column::InvTypeCode)
            .all(db)
            .await?
            .into_iter()
            .filter_map(|record| {
                let room_type =
                    room_types.get(&(record.inv_type_code.clone(), record.hotel_id.clone()))?;
                let sold_rooms = room_type.total_rooms - record.quantity;
                Some(SalesRow {
                    hotel_name: self.hotels.name_for(&record.hotel_id),
                    room_type_name: room_type.name.clone(),
                    total_rooms: room_type.total_rooms,
                    available_rooms: record.quantity,
                    sold_rooms,
                    occupancy_rate: percentage(
                        f64::from(sold_rooms),
                        f64::from(room_type.total_rooms),
                    ),
                    date: record.date,
                    inv_type_code: record.inv_type_code,
                    hotel_id: record.hotel_id,
                    status: record.status,
                })
            })
            .collect();

        Ok(aggregate_sales(
            SalesPeriod {
                start_date,
                end_date,
            },
            rows,
        ))
    }

    /// Chart series over the weeks starting within the last `weeks` weeks
    #[instrument(skip(self))]
    pub async fn dashboard_charts(
        &self,
        hotel_id: Option<&str>,
        weeks: u64,
        today: NaiveDate,
    ) -> Result<DashboardCharts, ServiceError> {
        let db = self.db_pool.as_ref();
        let since = today - Duration::weeks(weeks as i64);

        let mut query = WeeklyStatistics::find()
            .filter(weekly_statistics::Column::WeekStartDate.gte(since));
        if let Some(hotel_id) = hotel_id {
            query = query.filter(weekly_statistics::Column::HotelId.eq(hotel_id));
        }
        let rows = query
            .order_by_asc(weekly_statistics::Column::InvTypeCode)
            .order_by_asc(weekly_statistics::Column::WeekStartDate)
            .all(db)
            .await?;

        let mut per_week: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        let mut per_hotel: BTreeMap<&str, (Vec<f64>, BTreeSet<&str>)> = BTreeMap::new();
        for row in &rows {
            per_week
                .entry(row.week_start_date)
                .or_default()
                .push(row.actual_occupancy_rate);
            let hotel = per_hotel.entry(row.hotel_id.as_str()).or_default();
            hotel.0.push(row.actual_occupancy_rate);
            hotel.1.insert(row.inv_type_code.as_str());
        }

        let occupancy_trends: Vec<WeeklyOccupancyTrend> = per_week
            .into_iter()
            .map(|(week_start_date, rates)| WeeklyOccupancyTrend {
                week_start_date,
                avg_occupancy: round2(mean(rates.iter().copied())),
                room_types_count: rates.len(),
            })
            .collect();

        let mut hotel_comparison: Vec<HotelComparison> = if hotel_id.is_some() {
            Vec::new()
        } else {
            per_hotel
                .into_iter()
                .map(|(hotel, (rates, codes))| HotelComparison {
                    hotel_id: hotel.to_string(),
                    hotel_name: self.hotels.name_for(hotel),
                    avg_occupancy: round2(mean(rates.iter().copied())),
                    total_weeks: rates.len(),
                    room_types_count: codes.len(),
                })
                .collect()
        };
        hotel_comparison.sort_by(|a, b| b.avg_occupancy.total_cmp(&a.avg_occupancy));

        let room_performance_heatmap = rows
            .iter()
            .map(|row| HeatmapCell {
                inv_type_code: row.inv_type_code.clone(),
                hotel_id: row.hotel_id.clone(),
                hotel_name: self.hotels.name_for(&row.hotel_id),
                week_start_date: row.week_start_date,
                actual_occupancy_rate: row.actual_occupancy_rate,
            })
            .collect();

        Ok(DashboardCharts {
            metadata: ChartMetadata {
                weeks,
                hotel_id: hotel_id.map(str::to_string),
                since,
                data_points: occupancy_trends.len(),
            },
            occupancy_trends,
            room_performance_heatmap,
            hotel_comparison,
        })
    }
}

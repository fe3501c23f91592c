use crate::{
    db::DbPool,
    entities::{
        inventory_record::{self, Entity as InventoryRecord},
        room_type::{self, Entity as RoomType},
        weekly_statistics::{self, Entity as WeeklyStatistics},
    },
    errors::ServiceError,
    services::{hotels::HotelDirectory, round2},
};
use chrono::{Duration, NaiveDate};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// A statistics week always spans seven calendar days
pub const DAYS_PER_WEEK: i32 = 7;

/// One day of inventory as seen by the rate calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyAvailability {
    /// Rooms still unsold
    pub quantity: i32,
    pub is_open: bool,
}

/// Rates derived from a week of daily inventory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeeklyRates {
    /// Occupancy over open days only
    pub actual_occupancy_rate: f64,
    pub actual_vacancy_rate: f64,
    /// Occupancy over every day present regardless of status
    pub total_occupancy_rate: f64,
    pub total_vacancy_rate: f64,
    /// Number of open days
    pub total_available_days: i32,
    pub total_days: i32,
}

fn occupancy(occupied: f64, capacity: f64) -> f64 {
    if capacity <= 0.0 {
        0.0
    } else {
        round2(occupied / capacity * 100.0)
    }
}

/// Aggregates the days of one week into occupancy and vacancy rates.
///
/// Each pair sums to 100 within 0.01 since vacancy is taken from the rounded
/// occupancy. A zero denominator yields 0% occupancy.
pub fn compute_weekly_rates(total_rooms: i32, days: &[DailyAvailability]) -> WeeklyRates {
    let rooms = f64::from(total_rooms);
    let mut actual_occupied = 0.0;
    let mut actual_capacity = 0.0;
    let mut total_occupied = 0.0;
    let mut open_days = 0;

    for day in days {
        let occupied = f64::from(total_rooms - day.quantity);
        total_occupied += occupied;
        if day.is_open {
            actual_occupied += occupied;
            actual_capacity += rooms;
            open_days += 1;
        }
    }

    let actual_occupancy_rate = occupancy(actual_occupied, actual_capacity);
    let total_occupancy_rate = occupancy(total_occupied, rooms * days.len() as f64);

    WeeklyRates {
        actual_occupancy_rate,
        actual_vacancy_rate: round2(100.0 - actual_occupancy_rate),
        total_occupancy_rate,
        total_vacancy_rate: round2(100.0 - total_occupancy_rate),
        total_available_days: open_days,
        total_days: DAYS_PER_WEEK,
    }
}

/// Selection of weekly statistics rows.
///
/// `weeks` always limits the result to the N most recent distinct week starts
/// that match the remaining criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeeklyStatsFilter {
    /// Newest week of every room type
    Latest,
    ByRoomType {
        inv_type_code: String,
        weeks: Option<u64>,
    },
    ByHotel {
        hotel_id: String,
        weeks: Option<u64>,
    },
    ByRoomTypeAndHotel {
        inv_type_code: String,
        hotel_id: String,
        weeks: Option<u64>,
    },
    RecentWeeks {
        weeks: u64,
    },
}

impl WeeklyStatsFilter {
    pub fn from_params(
        inv_type_code: Option<String>,
        hotel_id: Option<String>,
        weeks: Option<u64>,
    ) -> Self {
        let inv_type_code = inv_type_code.filter(|c| !c.trim().is_empty());
        let hotel_id = hotel_id.filter(|h| !h.trim().is_empty());

        match (inv_type_code, hotel_id, weeks) {
            (Some(inv_type_code), Some(hotel_id), weeks) => Self::ByRoomTypeAndHotel {
                inv_type_code,
                hotel_id,
                weeks,
            },
            (Some(inv_type_code), None, weeks) => Self::ByRoomType {
                inv_type_code,
                weeks,
            },
            (None, Some(hotel_id), weeks) => Self::ByHotel { hotel_id, weeks },
            (None, None, Some(weeks)) => Self::RecentWeeks { weeks },
            (None, None, None) => Self::Latest,
        }
    }

    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        match self {
            Self::ByRoomType { inv_type_code, .. } => {
                condition =
                    condition.add(weekly_statistics::Column::InvTypeCode.eq(inv_type_code.clone()));
            }
            Self::ByHotel { hotel_id, .. } => {
                condition = condition.add(weekly_statistics::Column::HotelId.eq(hotel_id.clone()));
            }
            Self::ByRoomTypeAndHotel {
                inv_type_code,
                hotel_id,
                ..
            } => {
                condition = condition
                    .add(weekly_statistics::Column::InvTypeCode.eq(inv_type_code.clone()))
                    .add(weekly_statistics::Column::HotelId.eq(hotel_id.clone()));
            }
            Self::Latest | Self::RecentWeeks { .. } => {}
        }
        condition
    }

    fn weeks(&self) -> Option<u64> {
        match self {
            Self::Latest => None,
            Self::ByRoomType { weeks, .. }
            | Self::ByHotel { weeks, .. }
            | Self::ByRoomTypeAndHotel { weeks, .. } => *weeks,
            Self::RecentWeeks { weeks } => Some(*weeks),
        }
    }
}

/// Weekly statistics row enriched with display names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeeklyStatisticsView {
    pub inv_type_code: String,
    pub hotel_id: String,
    pub hotel_name: String,
    pub room_type_name: Option<String>,
    pub week_start_date: NaiveDate,
    pub week_end_date: NaiveDate,
    pub actual_occupancy_rate: f64,
    pub actual_vacancy_rate: f64,
    pub total_occupancy_rate: f64,
    pub total_vacancy_rate: f64,
    pub total_rooms: i32,
    pub total_available_days: i32,
    pub total_days: i32,
}

impl WeeklyStatisticsView {
    fn from_model(
        row: weekly_statistics::Model,
        room_type_name: Option<String>,
        hotels: &HotelDirectory,
    ) -> Self {
        Self {
            hotel_name: hotels.name_for(&row.hotel_id),
            room_type_name,
            inv_type_code: row.inv_type_code,
            hotel_id: row.hotel_id,
            week_start_date: row.week_start_date,
            week_end_date: row.week_end_date,
            actual_occupancy_rate: row.actual_occupancy_rate,
            actual_vacancy_rate: row.actual_vacancy_rate,
            total_occupancy_rate: row.total_occupancy_rate,
            total_vacancy_rate: row.total_vacancy_rate,
            total_rooms: row.total_rooms,
            total_available_days: row.total_available_days,
            total_days: row.total_days,
        }
    }
}

pub struct WeeklyStatisticsService {
    db_pool: Arc<DbPool>,
    hotels: HotelDirectory,
}

impl WeeklyStatisticsService {
    pub fn new(db_pool: Arc<DbPool>, hotels: HotelDirectory) -> Self {
        Self { db_pool, hotels }
    }

    /// Computes and stores the statistics of the week starting at `week_start`.
    ///
    /// Fails with `NotFound` when the room type is unknown or has no inventory
    /// in the window; nothing is written in that case.
    #[instrument(skip(self))]
    pub async fn calculate(
        &self,
        inv_type_code: &str,
        hotel_id: &str,
        week_start: NaiveDate,
    ) -> Result<WeeklyStatisticsView, ServiceError> {
        let db = self.db_pool.as_ref();
        let code = inv_type_code.to_string();
        let hotel = hotel_id.to_string();

        let (row, room_type_name) = db
            .transaction::<_, (weekly_statistics::Model, String), ServiceError>(move |txn| {
                Box::pin(async move {
                    let room_type = RoomType::find()
                        .filter(room_type::Column::InvTypeCode.eq(code.clone()))
                        .filter(room_type::Column::HotelId.eq(hotel.clone()))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "room type {} (hotel {})",
                                code, hotel
                            ))
                        })?;

                    let week_end = week_start + Duration::days(i64::from(DAYS_PER_WEEK - 1));
                    let days = InventoryRecord::find()
                        .filter(inventory_record::Column::InvTypeCode.eq(code.clone()))
                        .filter(inventory_record::Column::HotelId.eq(hotel.clone()))
                        .filter(inventory_record::Column::Date.between(week_start, week_end))
                        .order_by_asc(inventory_record::Column::Date)
                        .all(txn)
                        .await?;

                    if days.is_empty() {
                        return Err(ServiceError::NotFound(format!(
                            "no inventory for room type {} (hotel {}) between {} and {}",
                            code, hotel, week_start, week_end
                        )));
                    }

                    let availability: Vec<DailyAvailability> = days
                        .iter()
                        .map(|day| DailyAvailability {
                            quantity: day.quantity,
                            is_open: day.is_open(),
                        })
                        .collect();
                    let rates = compute_weekly_rates(room_type.total_rooms, &availability);

                    let stats = weekly_statistics::ActiveModel {
                        inv_type_code: Set(code.clone()),
                        hotel_id: Set(hotel.clone()),
                        week_start_date: Set(week_start),
                        week_end_date: Set(week_end),
                        actual_occupancy_rate: Set(rates.actual_occupancy_rate),
                        actual_vacancy_rate: Set(rates.actual_vacancy_rate),
                        total_occupancy_rate: Set(rates.total_occupancy_rate),
                        total_vacancy_rate: Set(rates.total_vacancy_rate),
                        total_rooms: Set(room_type.total_rooms),
                        total_available_days: Set(rates.total_available_days),
                        total_days: Set(rates.total_days),
                        ..Default::default()
                    };

                    WeeklyStatistics::insert(stats)
                        .on_conflict(
                            OnConflict::columns([
                                weekly_statistics::Column::InvTypeCode,
                                weekly_statistics::Column::WeekStartDate,
                                weekly_statistics::Column::HotelId,
                            ])
                            .update_columns([
                                weekly_statistics::Column::WeekEndDate,
                                weekly_statistics::Column::ActualOccupancyRate,
                                weekly_statistics::Column::ActualVacancyRate,
                                weekly_statistics::Column::TotalOccupancyRate,
                                weekly_statistics::Column::TotalVacancyRate,
                                weekly_statistics::Column::TotalRooms,
                                weekly_statistics::Column::TotalAvailableDays,
                                weekly_statistics::Column::TotalDays,
                            ])
                            .to_owned(),
                        )
                        .exec_without_returning(txn)
                        .await?;

                    let row = WeeklyStatistics::find()
                        .filter(weekly_statistics::Column::InvTypeCode.eq(code.clone()))
                        .filter(weekly_statistics::Column::HotelId.eq(hotel.clone()))
                        .filter(weekly_statistics::Column::WeekStartDate.eq(week_start))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::InternalError(
                                "weekly statistics row missing after upsert".to_string(),
                            )
                        })?;

                    Ok((row, room_type.name))
                })
            })
            .await?;

        info!(
            inv_type_code,
            hotel_id,
            %week_start,
            actual_occupancy_rate = row.actual_occupancy_rate,
            "Weekly statistics calculated"
        );

        Ok(WeeklyStatisticsView::from_model(
            row,
            Some(room_type_name),
            &self.hotels,
        ))
    }

    /// Lists stored statistics, newest week first
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &WeeklyStatsFilter,
    ) -> Result<Vec<WeeklyStatisticsView>, ServiceError> {
        let db = self.db_pool.as_ref();
        let condition = filter.condition();

        let mut query = WeeklyStatistics::find().filter(condition.clone());

        if let Some(weeks) = filter.weeks() {
            let week_starts: Vec<NaiveDate> = WeeklyStatistics::find()
                .select_only()
                .column(weekly_statistics::Column::WeekStartDate)
                .distinct()
                .filter(condition)
                .order_by_desc(weekly_statistics::Column::WeekStartDate)
                .limit(weeks)
                .into_tuple()
                .all(db)
                .await?;
            query = query.filter(weekly_statistics::Column::WeekStartDate.is_in(week_starts));
        }

        let rows = query
            .order_by_desc(weekly_statistics::Column::WeekStartDate)
            .order_by_asc(weekly_statistics::Column::HotelId)
            .order_by_asc(weekly_statistics::Column::InvTypeCode)
            .all(db)
            .await?;

        let rows = if matches!(filter, WeeklyStatsFilter::Latest) {
            let mut seen = HashSet::new();
            rows.into_iter()
                .filter(|row| seen.insert((row.inv_type_code.clone(), row.hotel_id.clone())))
                .collect()
        } else {
            rows
        };

        let names: HashMap<(String, String), String> = RoomType::find()
            .all(db)
            .await?
            .into_iter()
            .map(|rt| ((rt.inv_type_code, rt.hotel_id), rt.name))
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let name = names
                    .get(&(row.inv_type_code.clone(), row.hotel_id.clone()))
                    .cloned();
                WeeklyStatisticsView::from_model(row, name, &self.hotels)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn open(quantity: i32) -> DailyAvailability {
        DailyAvailability {
            quantity,
            is_open: true,
        }
    }

    fn closed(quantity: i32) -> DailyAvailability {
        DailyAvailability {
            quantity,
            is_open: false,
        }
    }

    #[test]
    fn full_open_week_matches_reference_example() {
        let days: Vec<_> = [10, 10, 8, 8, 6, 10, 10].into_iter().map(open).collect();
        let rates = compute_weekly_rates(10, &days);

        assert_eq!(rates.actual_occupancy_rate, 14.29);
        assert_eq!(rates.actual_vacancy_rate, 85.71);
        assert_eq!(rates.total_occupancy_rate, 14.29);
        assert_eq!(rates.total_vacancy_rate, 85.71);
        assert_eq!(rates.total_available_days, 7);
        assert_eq!(rates.total_days, 7);
    }

    #[test]
    fn closed_days_only_count_towards_total_rates() {
        // Two closed days fully blocked (quantity 0) would look sold out
        let days = vec![open(5), open(5), closed(0), closed(0), open(5)];
        let rates = compute_weekly_rates(10, &days);

        assert_eq!(rates.actual_occupancy_rate, 50.0);
        assert_eq!(rates.total_occupancy_rate, 70.0);
        assert_eq!(rates.total_vacancy_rate, 30.0);
        assert_eq!(rates.total_available_days, 3);
    }

    #[test]
    fn zero_denominators_yield_zero_occupancy() {
        let all_closed = compute_weekly_rates(10, &[closed(3), closed(4)]);
        assert_eq!(all_closed.actual_occupancy_rate, 0.0);
        assert_eq!(all_closed.actual_vacancy_rate, 100.0);
        assert_eq!(all_closed.total_available_days, 0);

        let no_rooms = compute_weekly_rates(0, &[open(0), open(0)]);
        assert_eq!(no_rooms.actual_occupancy_rate, 0.0);
        assert_eq!(no_rooms.total_occupancy_rate, 0.0);
        assert_eq!(no_rooms.total_vacancy_rate, 100.0);
    }

    proptest! {
        #[test]
        fn rate_pairs_always_sum_to_one_hundred(
            total_rooms in 0i32..200,
            raw_days in prop::collection::vec((0i32..200, any::<bool>()), 1..=7),
        ) {
            let days: Vec<_> = raw_days
                .into_iter()
                .map(|(q, is_open)| DailyAvailability {
                    quantity: q.min(total_rooms),
                    is_open,
                })
                .collect();
            let rates = compute_weekly_rates(total_rooms, &days);

            prop_assert!((rates.actual_occupancy_rate + rates.actual_vacancy_rate - 100.0).abs() <= 0.01);
            prop_assert!((rates.total_occupancy_rate + rates.total_vacancy_rate - 100.0).abs() <= 0.01);
            prop_assert!(rates.total_available_days <= days.len() as i32);
            prop_assert!((0.0..=100.0).contains(&rates.total_occupancy_rate));
        }
    }

    #[test]
    fn filter_is_built_from_optional_params() {
        assert_eq!(
            WeeklyStatsFilter::from_params(None, None, None),
            WeeklyStatsFilter::Latest
        );
        assert_eq!(
            WeeklyStatsFilter::from_params(None, None, Some(4)),
            WeeklyStatsFilter::RecentWeeks { weeks: 4 }
        );
        assert_eq!(
            WeeklyStatsFilter::from_params(Some("A".into()), None, None),
            WeeklyStatsFilter::ByRoomType {
                inv_type_code: "A".into(),
                weeks: None
            }
        );
        assert_eq!(
            WeeklyStatsFilter::from_params(Some("  ".into()), Some("2436".into()), Some(2)),
            WeeklyStatsFilter::ByHotel {
                hotel_id: "2436".into(),
                weeks: Some(2)
            }
        );
        let combined = WeeklyStatsFilter::from_params(Some("A".into()), Some("2436".into()), None);
        assert_eq!(combined.weeks(), None);
        assert!(matches!(
            combined,
            WeeklyStatsFilter::ByRoomTypeAndHotel { .. }
        ));
    }
}

use super::common::{ApiQuery, parse_date, success_response, validate_input};
use crate::{
    errors::ServiceError,
    services::weekly_statistics::{WeeklyStatisticsView, WeeklyStatsFilter},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
pub struct CalculateParams {
    /// Monday of the week, `YYYY-MM-DD`
    pub week_start_date: String,
    pub hotel_id: String,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct StatisticsQuery {
    pub inv_type_code: Option<String>,
    pub hotel_id: Option<String>,
    /// Number of most recent weeks
    #[validate(range(min = 1, max = 52))]
    pub weeks: Option<u64>,
}

pub fn statistics_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/calculate-weekly-statistics/:inv_type_code",
            post(calculate_weekly_statistics),
        )
        .route("/weekly-statistics", get(list_weekly_statistics))
}

/// Recompute one room type's week
#[utoipa::path(
    post,
    path = "/calculate-weekly-statistics/{inv_type_code}",
    params(
        ("inv_type_code" = String, Path, description = "Room type code"),
        CalculateParams
    ),
    responses(
        (status = 200, description = "Statistics stored", body = WeeklyStatisticsView),
        (status = 400, description = "Malformed date", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown room type or no inventory in the week", body = crate::errors::ErrorResponse)
    ),
    tag = "statistics"
)]
pub async fn calculate_weekly_statistics(
    State(state): State<AppState>,
    Path(inv_type_code): Path<String>,
    ApiQuery(params): ApiQuery<CalculateParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let week_start = parse_date("week_start_date", &params.week_start_date)?;
    let stats = state
        .services
        .statistics
        .calculate(&inv_type_code, &params.hotel_id, week_start)
        .await?;
    Ok(success_response(stats))
}

/// Stored weekly statistics
#[utoipa::path(
    get,
    path = "/weekly-statistics",
    params(StatisticsQuery),
    responses(
        (status = 200, description = "Newest week first", body = [WeeklyStatisticsView]),
        (status = 400, description = "weeks out of range", body = crate::errors::ErrorResponse)
    ),
    tag = "statistics"
)]
pub async fn list_weekly_statistics(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatisticsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&query)?;
    let filter = WeeklyStatsFilter::from_params(query.inv_type_code, query.hotel_id, query.weeks);
    let rows = state.services.statistics.list(&filter).await?;
    Ok(success_response(rows))
}

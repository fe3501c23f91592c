use super::common::{ApiQuery, parse_date_range, success_response, today, validate_input};
use crate::{
    errors::ServiceError,
    services::reports::{DashboardCharts, DashboardSummary, RoomTypeTrends, SalesStatus},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
pub struct HotelFilter {
    pub hotel_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct TrendParams {
    pub hotel_id: String,
    #[validate(range(min = 4, max = 26))]
    pub weeks: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SalesParams {
    pub start_date: String,
    pub end_date: String,
    pub hotel_id: Option<String>,
    pub inv_type_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct ChartParams {
    pub hotel_id: Option<String>,
    #[validate(range(min = 4, max = 26))]
    pub weeks: Option<u64>,
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard-summary", get(dashboard_summary))
        .route("/room-type-trends/:inv_type_code", get(room_type_trends))
        .route("/sales-status", get(sales_status))
        .route("/dashboard-charts", get(dashboard_charts))
}

/// Headline occupancy figures for the current week onward
#[utoipa::path(
    get,
    path = "/dashboard-summary",
    params(HotelFilter),
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardSummary)
    ),
    tag = "reports"
)]
pub async fn dashboard_summary(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<HotelFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let summary = state
        .services
        .reports
        .dashboard_summary(filter.hotel_id.as_deref(), today())
        .await?;
    Ok(success_response(summary))
}

#[utoipa::path(
    get,
    path = "/room-type-trends/{inv_type_code}",
    params(
        ("inv_type_code" = String, Path, description = "Room type code"),
        TrendParams
    ),
    responses(
        (status = 200, description = "Latest weeks with insights", body = RoomTypeTrends),
        (status = 400, description = "weeks out of range", body = crate::errors::ErrorResponse),
        (status = 404, description = "Room type not found", body = crate::errors::ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn room_type_trends(
    State(state): State<AppState>,
    Path(inv_type_code): Path<String>,
    ApiQuery(params): ApiQuery<TrendParams>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&params)?;
    let trends = state
        .services
        .reports
        .room_type_trends(&inv_type_code, &params.hotel_id, params.weeks.unwrap_or(12))
        .await?;
    Ok(success_response(trends))
}

/// Daily sold and available rooms over a date range
#[utoipa::path(
    get,
    path = "/sales-status",
    params(SalesParams),
    responses(
        (status = 200, description = "Sales report", body = SalesStatus),
        (status = 400, description = "Malformed or reversed dates", body = crate::errors::ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn sales_status(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SalesParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (start, end) = parse_date_range(&params.start_date, &params.end_date)?;
    let report = state
        .services
        .reports
        .sales_status(
            start,
            end,
            params.hotel_id.as_deref(),
            params.inv_type_code.as_deref(),
        )
        .await?;
    Ok(success_response(report))
}

#[utoipa::path(
    get,
    path = "/dashboard-charts",
    params(ChartParams),
    responses(
        (status = 200, description = "Chart series", body = DashboardCharts),
        (status = 400, description = "weeks out of range", body = crate::errors::ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn dashboard_charts(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ChartParams>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&params)?;
    let charts = state
        .services
        .reports
        .dashboard_charts(
            params.hotel_id.as_deref(),
            params.weeks.unwrap_or(8),
            today(),
        )
        .await?;
    Ok(success_response(charts))
}

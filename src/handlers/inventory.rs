use super::common::{ApiQuery, parse_date_range, success_response, validate_input};
use crate::{
    errors::ServiceError,
    services::inventory_fetch::{ApiCallView, FetchOutcome},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
pub struct FetchRoomTypeParams {
    /// First day to fetch, `YYYY-MM-DD`
    pub start_date: String,
    /// Last day to fetch, `YYYY-MM-DD`
    pub end_date: String,
    pub hotel_id: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct FetchAllParams {
    pub start_date: String,
    pub end_date: String,
    /// Restrict to the room types of one hotel
    pub hotel_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct ApiCallParams {
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<u64>,
}

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/fetch-inventory/:inv_type_code", post(fetch_room_type))
        .route("/fetch-all-inventory", post(fetch_all))
        .route("/api-calls", get(list_api_calls))
}

/// Pull one room type's availability from the channel manager
#[utoipa::path(
    post,
    path = "/fetch-inventory/{inv_type_code}",
    params(
        ("inv_type_code" = String, Path, description = "Room type code"),
        FetchRoomTypeParams
    ),
    responses(
        (status = 200, description = "Availability stored", body = FetchOutcome),
        (status = 400, description = "Malformed or reversed dates", body = crate::errors::ErrorResponse),
        (status = 502, description = "Channel manager call failed", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn fetch_room_type(
    State(state): State<AppState>,
    Path(inv_type_code): Path<String>,
    ApiQuery(params): ApiQuery<FetchRoomTypeParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (start, end) = parse_date_range(&params.start_date, &params.end_date)?;
    let outcome = state
        .services
        .fetcher
        .fetch_room_type(&inv_type_code, &params.hotel_id, start, end)
        .await?;
    Ok(success_response(outcome))
}

/// Pull every configured room type, continuing past failures
#[utoipa::path(
    post,
    path = "/fetch-all-inventory",
    params(FetchAllParams),
    responses(
        (status = 200, description = "One outcome per room type", body = [FetchOutcome]),
        (status = 400, description = "Malformed or reversed dates", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn fetch_all(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<FetchAllParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (start, end) = parse_date_range(&params.start_date, &params.end_date)?;
    let outcomes = state
        .services
        .fetcher
        .fetch_all(start, end, params.hotel_id.as_deref())
        .await?;
    let failed = outcomes.iter().filter(|o| !o.success).count();
    info!(total = outcomes.len(), failed, "Fetch-all finished");
    Ok(success_response(outcomes))
}

/// Recent upstream calls
#[utoipa::path(
    get,
    path = "/api-calls",
    params(ApiCallParams),
    responses(
        (status = 200, description = "Newest calls first", body = [ApiCallView]),
        (status = 400, description = "Limit out of range", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_api_calls(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ApiCallParams>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&params)?;
    let calls = state
        .services
        .fetcher
        .list_api_calls(params.limit.unwrap_or(50))
        .await?;
    Ok(success_response(calls))
}

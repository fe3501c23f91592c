use super::common::{ApiQuery, parse_date, success_response, validate_input};
use crate::{
    errors::ServiceError,
    services::{
        comparison::{SnapshotComparison, WeeklyChanges},
        snapshots::{SnapshotCreated, SnapshotDeleted, SnapshotSummary},
    },
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
pub struct CreateSnapshotParams {
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct SnapshotListParams {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CompareParams {
    /// Date of the older snapshot, `YYYY-MM-DD`
    pub from_date: String,
    /// Date of the newer snapshot, `YYYY-MM-DD`
    pub to_date: String,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct WeeklyChangesParams {
    #[validate(range(min = 1, max = 12))]
    pub weeks: Option<u64>,
    pub hotel_id: Option<String>,
}

pub fn snapshot_routes() -> Router<AppState> {
    Router::new()
        .route("/create-snapshot", post(create_snapshot))
        .route("/snapshots", get(list_snapshots))
        .route("/snapshots/:id", get(get_snapshot).delete(delete_snapshot))
        .route("/compare-snapshots", get(compare_snapshots))
        .route("/weekly-changes", get(weekly_changes))
}

/// Snapshot today's inventory and statistics
#[utoipa::path(
    post,
    path = "/create-snapshot",
    params(CreateSnapshotParams),
    responses(
        (status = 200, description = "Snapshot created, or today's existing snapshot", body = SnapshotCreated),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "snapshots"
)]
pub async fn create_snapshot(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CreateSnapshotParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let description = params.description.filter(|d| !d.trim().is_empty());
    let created = state.services.snapshots.create_snapshot(description).await?;
    Ok(success_response(created))
}

#[utoipa::path(
    get,
    path = "/snapshots",
    params(SnapshotListParams),
    responses(
        (status = 200, description = "Newest snapshots first", body = [SnapshotSummary]),
        (status = 400, description = "Limit out of range", body = crate::errors::ErrorResponse)
    ),
    tag = "snapshots"
)]
pub async fn list_snapshots(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SnapshotListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&params)?;
    let snapshots = state
        .services
        .snapshots
        .list(params.limit.unwrap_or(10))
        .await?;
    Ok(success_response(snapshots))
}

#[utoipa::path(
    get,
    path = "/snapshots/{id}",
    params(("id" = i32, Path, description = "Snapshot id")),
    responses(
        (status = 200, description = "Snapshot details", body = SnapshotSummary),
        (status = 404, description = "Snapshot not found", body = crate::errors::ErrorResponse)
    ),
    tag = "snapshots"
)]
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let snapshot = state.services.snapshots.get(id).await?;
    Ok(success_response(snapshot))
}

/// Delete a snapshot and its copied rows
#[utoipa::path(
    delete,
    path = "/snapshots/{id}",
    params(("id" = i32, Path, description = "Snapshot id")),
    responses(
        (status = 200, description = "Snapshot deleted", body = SnapshotDeleted),
        (status = 404, description = "Snapshot not found", body = crate::errors::ErrorResponse)
    ),
    tag = "snapshots"
)]
pub async fn delete_snapshot(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let deleted = state.services.snapshots.delete(id).await?;
    Ok(success_response(deleted))
}

/// Occupancy changes between the snapshots of two dates
#[utoipa::path(
    get,
    path = "/compare-snapshots",
    params(CompareParams),
    responses(
        (status = 200, description = "Changes and their summary", body = SnapshotComparison),
        (status = 400, description = "Malformed date", body = crate::errors::ErrorResponse),
        (status = 404, description = "No completed snapshot for a date", body = crate::errors::ErrorResponse)
    ),
    tag = "snapshots"
)]
pub async fn compare_snapshots(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CompareParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let from = parse_date("from_date", &params.from_date)?;
    let to = parse_date("to_date", &params.to_date)?;
    let comparison = state.services.comparison.compare_snapshots(from, to).await?;
    Ok(success_response(comparison))
}

/// Changes between consecutive recent snapshots
#[utoipa::path(
    get,
    path = "/weekly-changes",
    params(WeeklyChangesParams),
    responses(
        (status = 200, description = "One period per consecutive snapshot pair", body = WeeklyChanges),
        (status = 400, description = "weeks out of range", body = crate::errors::ErrorResponse)
    ),
    tag = "snapshots"
)]
pub async fn weekly_changes(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<WeeklyChangesParams>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&params)?;
    let changes = state
        .services
        .comparison
        .weekly_changes(params.weeks.unwrap_or(4), params.hotel_id.as_deref())
        .await?;
    Ok(success_response(changes))
}

use super::common::{ApiQuery, accepted_response, success_response};
use crate::{errors::ServiceError, services::weekly_update::JobStatus, AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct WeeklyUpdateParams {
    /// Restrict the run to one hotel
    pub hotel_id: Option<String>,
}

pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/weekly-update", post(start_weekly_update))
        .route("/weekly-update/jobs", get(list_jobs))
        .route("/weekly-update/jobs/:job_id", get(get_job))
}

/// Start a weekly update in the background
#[utoipa::path(
    post,
    path = "/weekly-update",
    params(WeeklyUpdateParams),
    responses(
        (status = 202, description = "Job queued", body = JobStatus)
    ),
    tag = "weekly-update"
)]
pub async fn start_weekly_update(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<WeeklyUpdateParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let hotel_id = params.hotel_id.filter(|h| !h.trim().is_empty());
    let job = state.services.jobs.submit(hotel_id).await;
    Ok(accepted_response(job, "Weekly update started in background"))
}

#[utoipa::path(
    get,
    path = "/weekly-update/jobs",
    responses(
        (status = 200, description = "All jobs, newest first", body = [JobStatus])
    ),
    tag = "weekly-update"
)]
pub async fn list_jobs(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.jobs.list()))
}

#[utoipa::path(
    get,
    path = "/weekly-update/jobs/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job status", body = JobStatus),
        (status = 404, description = "Unknown job", body = crate::errors::ErrorResponse)
    ),
    tag = "weekly-update"
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let job = state
        .services
        .jobs
        .status(job_id)
        .ok_or_else(|| ServiceError::NotFound(format!("weekly update job {}", job_id)))?;
    Ok(success_response(job))
}

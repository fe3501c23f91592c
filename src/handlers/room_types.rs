use super::common::{ApiQuery, created_response, success_response, validate_input};
use crate::{
    errors::ServiceError,
    services::room_types::{CreateRoomType, RoomTypeView, UpdateRoomType},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct RoomTypeFilters {
    /// Restrict to one hotel
    pub hotel_id: Option<String>,
}

pub fn room_type_routes() -> Router<AppState> {
    Router::new()
        .route("/room-types", get(list_room_types).post(create_room_type))
        .route("/room-types/:id", put(update_room_type).delete(delete_room_type))
}

/// List room types
#[utoipa::path(
    get,
    path = "/room-types",
    params(RoomTypeFilters),
    responses(
        (status = 200, description = "Room types ordered by hotel then code", body = [RoomTypeView]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "room-types"
)]
pub async fn list_room_types(
    State(state): State<AppState>,
    ApiQuery(filters): ApiQuery<RoomTypeFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let room_types = state
        .services
        .room_types
        .list(filters.hotel_id.as_deref())
        .await?;
    Ok(success_response(room_types))
}

/// Register a room type
#[utoipa::path(
    post,
    path = "/room-types",
    request_body = CreateRoomType,
    responses(
        (status = 201, description = "Room type created", body = RoomTypeView),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Room type already exists for the hotel", body = crate::errors::ErrorResponse)
    ),
    tag = "room-types"
)]
pub async fn create_room_type(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoomType>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let created = state.services.room_types.create(payload).await?;
    Ok(created_response(created))
}

/// Update name and room count
#[utoipa::path(
    put,
    path = "/room-types/{id}",
    params(("id" = i32, Path, description = "Room type id")),
    request_body = UpdateRoomType,
    responses(
        (status = 200, description = "Room type updated", body = RoomTypeView),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Room type not found", body = crate::errors::ErrorResponse)
    ),
    tag = "room-types"
)]
pub async fn update_room_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRoomType>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let updated = state.services.room_types.update(id, payload).await?;
    Ok(success_response(updated))
}

/// Delete a room type without inventory or statistics
#[utoipa::path(
    delete,
    path = "/room-types/{id}",
    params(("id" = i32, Path, description = "Room type id")),
    responses(
        (status = 200, description = "Room type deleted"),
        (status = 404, description = "Room type not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Room type still has dependent rows", body = crate::errors::ErrorResponse)
    ),
    tag = "room-types"
)]
pub async fn delete_room_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.room_types.delete(id).await?;
    Ok(success_response(json!({ "id": id, "deleted": true })))
}

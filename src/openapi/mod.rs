use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hotel Inventory API",
        version = "0.1.0",
        description = r#"
# Hotel Inventory API

Collects daily room availability from the channel manager, derives weekly
occupancy statistics and keeps dated snapshots for week-over-week comparison.

## Dates

Every date in a path or query string is `YYYY-MM-DD`. Malformed dates are
rejected with `400 Bad Request`.

## Error Handling

Failures share one body:

```json
{
  "error": "Not Found",
  "message": "Not found: no completed snapshot for 2024-01-08",
  "request_id": "3f0c...",
  "timestamp": "2024-01-08T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development")
    ),
    tags(
        (name = "room-types", description = "Room type administration"),
        (name = "inventory", description = "Channel manager ingestion"),
        (name = "statistics", description = "Weekly occupancy statistics"),
        (name = "snapshots", description = "Snapshots and comparisons"),
        (name = "weekly-update", description = "Background weekly update"),
        (name = "reports", description = "Dashboard reports"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::room_types::list_room_types,
        crate::handlers::room_types::create_room_type,
        crate::handlers::room_types::update_room_type,
        crate::handlers::room_types::delete_room_type,

        crate::handlers::inventory::fetch_room_type,
        crate::handlers::inventory::fetch_all,
        crate::handlers::inventory::list_api_calls,

        crate::handlers::statistics::calculate_weekly_statistics,
        crate::handlers::statistics::list_weekly_statistics,

        crate::handlers::snapshots::create_snapshot,
        crate::handlers::snapshots::list_snapshots,
        crate::handlers::snapshots::get_snapshot,
        crate::handlers::snapshots::delete_snapshot,
        crate::handlers::snapshots::compare_snapshots,
        crate::handlers::snapshots::weekly_changes,

        crate::handlers::jobs::start_weekly_update,
        crate::handlers::jobs::list_jobs,
        crate::handlers::jobs::get_job,

        crate::handlers::reports::dashboard_summary,
        crate::handlers::reports::room_type_trends,
        crate::handlers::reports::sales_status,
        crate::handlers::reports::dashboard_charts,

        crate::health::health_check,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::ResponseMeta,

            crate::services::room_types::CreateRoomType,
            crate::services::room_types::UpdateRoomType,
            crate::services::room_types::RoomTypeView,

            crate::services::inventory_fetch::FetchOutcome,
            crate::services::inventory_fetch::ApiCallView,

            crate::services::weekly_statistics::WeeklyRates,
            crate::services::weekly_statistics::WeeklyStatisticsView,

            crate::entities::data_snapshot::SnapshotStatus,
            crate::services::snapshots::SnapshotCreated,
            crate::services::snapshots::SnapshotSummary,
            crate::services::snapshots::SnapshotDeleted,

            crate::services::comparison::ChangeType,
            crate::services::comparison::OccupancyChange,
            crate::services::comparison::ComparisonSummary,
            crate::services::comparison::SnapshotRef,
            crate::services::comparison::ComparisonPeriod,
            crate::services::comparison::SnapshotComparison,
            crate::services::comparison::WeeklyChangePeriod,
            crate::services::comparison::WeeklyChanges,

            crate::services::weekly_update::JobState,
            crate::services::weekly_update::JobStatus,
            crate::services::weekly_update::WeeklyUpdateReport,

            crate::services::reports::DashboardSummary,
            crate::services::reports::RoomTypeOccupancy,
            crate::services::reports::RoomTypeTrends,
            crate::services::reports::TrendPoint,
            crate::services::reports::TrendInsights,
            crate::services::reports::TrendDirection,
            crate::services::reports::SalesStatus,
            crate::services::reports::DashboardCharts,

            crate::health::HealthReport,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

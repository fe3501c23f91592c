mod common;

use axum::http::{Method, StatusCode};
use common::{date, days, TestApp};
use hotel_inventory_api::entities::{
    data_snapshot, inventory_snapshot, weekly_statistics, weekly_statistics_snapshot,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use serde_json::json;

async fn set_rate(app: &TestApp, row: weekly_statistics::Model, rate: f64) {
    let mut active: weekly_statistics::ActiveModel = row.into();
    active.actual_occupancy_rate = Set(rate);
    active.actual_vacancy_rate = Set(100.0 - rate);
    active
        .update(app.state.db.as_ref())
        .await
        .expect("update statistics");
}

#[tokio::test]
async fn snapshot_creation_is_idempotent_per_day() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    app.seed_inventory("A", "2436", &days(date("2024-01-08"), 7, 5, "OPEN"))
        .await;
    app.seed_statistics("A", "2436", date("2024-01-08"), 50.0).await;

    let (status, first) = app
        .json(Method::POST, "/create-snapshot?description=before%20update", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["created"], json!(true));
    let id = first["data"]["snapshot_id"].as_i64().expect("snapshot id");

    let (status, second) = app.json(Method::POST, "/create-snapshot", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["created"], json!(false));
    assert_eq!(second["data"]["snapshot_id"], json!(id));

    let (status, body) = app
        .json(Method::GET, &format!("/snapshots/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let snapshot = &body["data"];
    assert_eq!(snapshot["status"], json!("completed"));
    assert_eq!(snapshot["description"], json!("before update"));
    assert_eq!(snapshot["total_records"], json!(8));
    assert_eq!(snapshot["room_types_count"], json!(1));
    assert_eq!(snapshot["earliest_week"], json!("2024-01-08"));

    let (_, body) = app.json(Method::GET, "/snapshots", None).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let db = app.state.db.as_ref();
    let inventory_copies = inventory_snapshot::Entity::find()
        .count(db)
        .await
        .expect("count");
    let statistics_copies = weekly_statistics_snapshot::Entity::find()
        .count(db)
        .await
        .expect("count");
    assert_eq!(inventory_copies, 7);
    assert_eq!(statistics_copies, 1);
}

#[tokio::test]
async fn failed_copy_leaves_no_partial_snapshot() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    app.seed_inventory("A", "2436", &days(date("2024-01-08"), 7, 5, "OPEN"))
        .await;
    app.seed_statistics("A", "2436", date("2024-01-08"), 50.0).await;

    // The statistics copy runs after the inventory copy and now has no target table
    let db = app.state.db.as_ref();
    db.execute_unprepared("DROP TABLE weekly_statistics_snapshots")
        .await
        .expect("drop table");

    let result = app
        .state
        .services
        .snapshots
        .create_snapshot_for_date(date("2024-01-10"), Some("doomed".into()))
        .await;
    assert!(result.is_err());

    let snapshots = data_snapshot::Entity::find().count(db).await.expect("count");
    let inventory_copies = inventory_snapshot::Entity::find()
        .count(db)
        .await
        .expect("count");
    assert_eq!(snapshots, 0);
    assert_eq!(inventory_copies, 0);

    let (status, body) = app.json(Method::GET, "/snapshots", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn deleting_a_snapshot_removes_its_rows() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    app.seed_inventory("A", "2436", &days(date("2024-01-08"), 3, 5, "OPEN"))
        .await;
    app.seed_statistics("A", "2436", date("2024-01-08"), 50.0).await;

    let created = app
        .state
        .services
        .snapshots
        .create_snapshot_for_date(date("2024-01-10"), None)
        .await
        .expect("snapshot");

    let (status, body) = app
        .json(
            Method::DELETE,
            &format!("/snapshots/{}", created.snapshot_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["inventory_rows"], json!(3));
    assert_eq!(body["data"]["statistics_rows"], json!(1));

    let db = app.state.db.as_ref();
    let inventory_left = inventory_snapshot::Entity::find()
        .filter(inventory_snapshot::Column::SnapshotId.eq(created.snapshot_id))
        .count(db)
        .await
        .expect("count");
    let statistics_left = weekly_statistics_snapshot::Entity::find()
        .filter(weekly_statistics_snapshot::Column::SnapshotId.eq(created.snapshot_id))
        .count(db)
        .await
        .expect("count");
    assert_eq!(inventory_left, 0);
    assert_eq!(statistics_left, 0);

    let (status, _) = app
        .json(
            Method::GET,
            &format!("/snapshots/{}", created.snapshot_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Live data is untouched
    let live = weekly_statistics::Entity::find().count(db).await.expect("count");
    assert_eq!(live, 1);
}

#[tokio::test]
async fn comparing_two_dates_reports_occupancy_changes() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    app.seed_room_type("B", "2436", 10).await;
    let a = app.seed_statistics("A", "2436", date("2024-01-08"), 50.0).await;
    let b = app.seed_statistics("B", "2436", date("2024-01-08"), 70.0).await;

    let snapshots = &app.state.services.snapshots;
    snapshots
        .create_snapshot_for_date(date("2024-01-01"), None)
        .await
        .expect("first snapshot");

    set_rate(&app, a, 60.0).await;
    set_rate(&app, b, 65.5).await;
    app.seed_statistics("A", "2436", date("2024-01-15"), 0.0).await;

    snapshots
        .create_snapshot_for_date(date("2024-01-08"), None)
        .await
        .expect("second snapshot");

    let (status, body) = app
        .json(
            Method::GET,
            "/compare-snapshots?from_date=2024-01-01&to_date=2024-01-08",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let comparison = &body["data"];
    assert_eq!(comparison["summary"]["total_changes"], json!(3));
    assert_eq!(comparison["summary"]["modified_records"], json!(2));
    assert_eq!(comparison["summary"]["new_records"], json!(1));
    assert_eq!(
        comparison["summary"]["biggest_increase"]["occupancy_diff"],
        json!(10.0)
    );
    assert_eq!(
        comparison["summary"]["biggest_decrease"]["occupancy_diff"],
        json!(-4.5)
    );

    let changes = comparison["changes"].as_array().expect("changes");
    let increase = changes
        .iter()
        .find(|c| c["inv_type_code"] == json!("A") && c["change_type"] == json!("changed"))
        .expect("changed row for A");
    assert_eq!(increase["from_occupancy"], json!(50.0));
    assert_eq!(increase["to_occupancy"], json!(60.0));
    assert_eq!(increase["hotel_name"], json!("霧繞"));

    // A new week with zero occupancy is still reported
    let new_row = changes
        .iter()
        .find(|c| c["change_type"] == json!("new"))
        .expect("new row");
    assert_eq!(new_row["week_start_date"], json!("2024-01-15"));
    assert_eq!(new_row["to_occupancy"], json!(0.0));
}

#[tokio::test]
async fn comparing_with_a_missing_snapshot_is_not_found() {
    let app = TestApp::new().await;
    app.state
        .services
        .snapshots
        .create_snapshot_for_date(date("2024-01-01"), None)
        .await
        .expect("snapshot");

    let (status, body) = app
        .json(
            Method::GET,
            "/compare-snapshots?from_date=2024-01-01&to_date=2024-02-01",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("2024-02-01"));

    let (status, _) = app
        .json(
            Method::GET,
            "/compare-snapshots?from_date=yesterday&to_date=2024-02-01",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_comparison_dates_use_the_error_body() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(Method::GET, "/compare-snapshots?from_date=2024-01-01", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Bad Request"));
    assert_eq!(body["kind"], json!("validation"));
    assert!(body["message"].as_str().unwrap().contains("to_date"));
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn weekly_changes_need_two_snapshots() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    let row = app.seed_statistics("A", "2436", date("2024-01-08"), 40.0).await;

    let snapshots = &app.state.services.snapshots;
    snapshots
        .create_snapshot_for_date(date("2024-01-01"), None)
        .await
        .expect("snapshot");

    let (status, body) = app.json(Method::GET, "/weekly-changes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["available_snapshots"], json!(1));
    assert_eq!(body["data"]["periods"], json!([]));
    assert!(body["data"]["message"].is_string());

    set_rate(&app, row, 45.0).await;
    snapshots
        .create_snapshot_for_date(date("2024-01-08"), None)
        .await
        .expect("snapshot");

    let (_, body) = app
        .json(Method::GET, "/weekly-changes?weeks=2&hotel_id=2436", None)
        .await;
    let periods = body["data"]["periods"].as_array().expect("periods");
    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0]["from_date"], json!("2024-01-01"));
    assert_eq!(periods[0]["to_date"], json!("2024-01-08"));
    assert_eq!(periods[0]["summary"]["modified_records"], json!(1));

    let (status, _) = app
        .json(Method::GET, "/weekly-changes?weeks=13", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

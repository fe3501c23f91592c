mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Local};
use common::{date, days, TestApp};
use hotel_inventory_api::services::weekly_update::week_monday;
use serde_json::json;

#[tokio::test]
async fn dashboard_summary_ranks_room_types_of_the_current_window() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    app.seed_room_type("B", "2436", 10).await;
    app.seed_room_type("C", "2799", 10).await;

    let monday = week_monday(Local::now().date_naive());
    app.seed_statistics("A", "2436", monday, 80.0).await;
    app.seed_statistics("A", "2436", monday + Duration::weeks(1), 60.0).await;
    app.seed_statistics("B", "2436", monday, 20.0).await;
    // Past weeks are outside the summary window
    app.seed_statistics("C", "2799", monday - Duration::weeks(1), 99.0).await;

    let (status, body) = app.json(Method::GET, "/dashboard-summary", None).await;
    assert_eq!(status, StatusCode::OK);
    let summary = &body["data"];
    assert_eq!(summary["total_hotels"], json!(2));
    assert_eq!(summary["total_room_types"], json!(3));
    assert_eq!(summary["avg_occupancy_rate"], json!(45.0));
    assert_eq!(summary["best_performer"]["inv_type_code"], json!("A"));
    assert_eq!(summary["best_performer"]["avg_occupancy"], json!(70.0));
    assert_eq!(summary["worst_performer"]["inv_type_code"], json!("B"));
    assert_eq!(
        summary["data_period_start"],
        json!(monday.format("%Y-%m-%d").to_string())
    );
    assert!(summary["latest_snapshot"].is_null());

    let (_, body) = app
        .json(Method::GET, "/dashboard-summary?hotel_id=2799", None)
        .await;
    assert_eq!(body["data"]["total_hotels"], json!(1));
    assert_eq!(body["data"]["total_room_types"], json!(1));
    assert_eq!(body["data"]["room_types_overview"], json!([]));
}

#[tokio::test]
async fn room_type_trends_report_direction_and_extremes() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    app.seed_statistics("A", "2436", date("2024-01-08"), 20.0).await;
    app.seed_statistics("A", "2436", date("2024-01-15"), 60.0).await;
    app.seed_statistics("A", "2436", date("2024-01-22"), 55.5).await;

    let (status, body) = app
        .json(Method::GET, "/room-type-trends/A?hotel_id=2436&weeks=4", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let trends = &body["data"];
    assert_eq!(trends["room_type"]["name"], json!("Room A"));
    assert_eq!(trends["data_points"].as_array().map(Vec::len), Some(3));
    assert_eq!(trends["data_points"][0]["week_start_date"], json!("2024-01-22"));
    assert_eq!(trends["insights"]["trend_direction"], json!("down"));
    assert_eq!(trends["insights"]["occupancy_change"], json!(-4.5));
    assert_eq!(
        trends["insights"]["peak_week"]["week_start_date"],
        json!("2024-01-15")
    );
    assert_eq!(trends["insights"]["average_occupancy"], json!(45.17));
}

#[tokio::test]
async fn room_type_trends_validate_their_inputs() {
    let app = TestApp::new().await;

    let (status, _) = app
        .json(Method::GET, "/room-type-trends/Z?hotel_id=2436", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.seed_room_type("A", "2436", 10).await;
    let (status, _) = app
        .json(Method::GET, "/room-type-trends/A?hotel_id=2436&weeks=2", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sales_status_aggregates_days_and_room_types() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    app.seed_room_type("B", "2799", 4).await;
    app.seed_inventory("A", "2436", &days(date("2024-01-08"), 2, 6, "OPEN"))
        .await;
    app.seed_inventory("B", "2799", &days(date("2024-01-08"), 2, 0, "OPEN"))
        .await;
    // Outside the requested range
    app.seed_inventory("A", "2436", &days(date("2024-02-01"), 1, 0, "OPEN"))
        .await;

    let (status, body) = app
        .json(
            Method::GET,
            "/sales-status?start_date=2024-01-08&end_date=2024-01-09",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let report = &body["data"];
    assert_eq!(report["summary"]["total_rooms"], json!(28));
    assert_eq!(report["summary"]["total_sold"], json!(16));
    assert_eq!(report["summary"]["total_available"], json!(12));
    assert_eq!(report["summary"]["avg_occupancy_rate"], json!(57.14));
    assert_eq!(report["summary"]["total_days"], json!(2));
    assert_eq!(report["daily_data"][0]["date"], json!("2024-01-08"));
    assert_eq!(report["detailed_data"][0]["date"], json!("2024-01-09"));
    assert_eq!(report["detailed_data"].as_array().map(Vec::len), Some(4));
    assert_eq!(report["room_type_performance"][0]["inv_type_code"], json!("B"));
    assert_eq!(
        report["room_type_performance"][0]["avg_occupancy_rate"],
        json!(100.0)
    );

    let (_, body) = app
        .json(
            Method::GET,
            "/sales-status?start_date=2024-01-08&end_date=2024-01-09&hotel_id=2436&inv_type_code=A",
            None,
        )
        .await;
    assert_eq!(body["data"]["summary"]["total_rooms"], json!(20));
    assert_eq!(body["data"]["summary"]["avg_occupancy_rate"], json!(40.0));
}

#[tokio::test]
async fn sales_status_rejects_bad_ranges() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(
            Method::GET,
            "/sales-status?start_date=2024-1-8x&end_date=2024-01-09",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("start_date"));

    let (status, _) = app
        .json(
            Method::GET,
            "/sales-status?start_date=2024-01-09&end_date=2024-01-08",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_charts_group_recent_weeks() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    app.seed_room_type("B", "2799", 10).await;

    let monday = week_monday(Local::now().date_naive());
    app.seed_statistics("A", "2436", monday, 40.0).await;
    app.seed_statistics("B", "2799", monday, 80.0).await;
    app.seed_statistics("A", "2436", monday - Duration::weeks(1), 50.0).await;
    app.seed_statistics("A", "2436", monday - Duration::weeks(30), 10.0).await;

    let (status, body) = app.json(Method::GET, "/dashboard-charts", None).await;
    assert_eq!(status, StatusCode::OK);
    let charts = &body["data"];
    let trends = charts["occupancy_trends"].as_array().expect("trends");
    assert_eq!(trends.len(), 2);
    assert_eq!(trends[1]["avg_occupancy"], json!(60.0));
    assert_eq!(trends[1]["room_types_count"], json!(2));
    assert_eq!(charts["room_performance_heatmap"].as_array().map(Vec::len), Some(3));
    assert_eq!(charts["hotel_comparison"][0]["hotel_id"], json!("2799"));
    assert_eq!(charts["hotel_comparison"][1]["avg_occupancy"], json!(45.0));
    assert_eq!(charts["metadata"]["weeks"], json!(8));

    let (_, body) = app
        .json(Method::GET, "/dashboard-charts?hotel_id=2436&weeks=4", None)
        .await;
    assert_eq!(body["data"]["hotel_comparison"], json!([]));
    assert_eq!(body["data"]["occupancy_trends"].as_array().map(Vec::len), Some(2));

    let (status, _) = app
        .json(Method::GET, "/dashboard-charts?weeks=27", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
